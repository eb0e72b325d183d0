use axum::extract::{Extension, Json, Path, State};

use crate::{
    AppState,
    error::AppError,
    models::{CurrentUser, MenuMap},
    result::ApiResponse,
    utils::success_to_api_response,
};

/// GET /menus/{level_code}：调用方只能读取自己角色的菜单
#[axum::debug_handler]
pub async fn level_menus(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(level_code): Path<String>,
) -> Result<Json<ApiResponse<MenuMap>>, AppError> {
    if level_code != current.level_code {
        tracing::warn!(
            "User {} with level {} requested menus of level {}",
            current.code,
            current.level_code,
            level_code
        );
        return Err(AppError::Forbidden);
    }

    let menu = load_menu(&state, &level_code).await?;
    Ok(success_to_api_response(menu))
}

/// 先读缓存，未命中再查库并回填；缓存故障只记日志
pub async fn load_menu(state: &AppState, level_code: &str) -> Result<MenuMap, AppError> {
    if let Some(cache) = &state.menu_cache {
        match cache.get(level_code).await {
            Ok(Some(menu)) => return Ok(menu),
            Ok(None) => tracing::debug!("Menu cache miss for level: {}", level_code),
            Err(e) => tracing::warn!("Menu cache read failed for level {}: {}", level_code, e),
        }
    }

    let rows = state.menus.menus_for_level(level_code).await?;
    let menu = MenuMap::from_rows(rows);

    if let Some(cache) = &state.menu_cache {
        if let Err(e) = cache.put(level_code, &menu).await {
            tracing::warn!("Menu cache write failed for level {}: {}", level_code, e);
        }
    }

    Ok(menu)
}
