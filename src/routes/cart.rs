use axum::{extract::State, Extension, Json};
use tracing::info;

use crate::models::{AddToCartRequest, AppState, CartResponse};
use crate::token::Principal;
use crate::types::{AppError, AppResult};

pub async fn list_cart(
    State(state): State<AppState>,
    Extension(user): Extension<Principal>,
) -> AppResult<Json<CartResponse>> {
    cart_response(&state, &user).await
}

pub async fn add_to_cart(
    State(state): State<AppState>,
    Extension(user): Extension<Principal>,
    Json(request): Json<AddToCartRequest>,
) -> AppResult<Json<CartResponse>> {
    let found = state
        .metadata
        .add_to_cart(&user, request.image_id)
        .await
        .map_err(AppError::Metadata)?;
    if !found {
        return Err(AppError::NotFound(format!("image {}", request.image_id)));
    }

    info!(user_id = %user, image_id = %request.image_id, "Added image to cart");
    cart_response(&state, &user).await
}

async fn cart_response(state: &AppState, user: &Principal) -> AppResult<Json<CartResponse>> {
    let items = state
        .metadata
        .cart_for_user(user)
        .await
        .map_err(AppError::Metadata)?;

    Ok(Json(CartResponse {
        success: true,
        items,
    }))
}
