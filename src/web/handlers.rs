//! Web 路由处理函数
//!
//! 实现 Web 服务器的路由处理逻辑

use super::WebAppState;
use crate::health::{Snapshot, StatusView};
use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Json},
};
use serde::Serialize;
use tracing::error;

/// 状态页模板
#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    title: String,
    services: Vec<ServiceRow>,
    current_time: String,
    online_count: usize,
    offline_count: usize,
}

/// 页面中的一行
struct ServiceRow {
    name: String,
    url: String,
    description: String,
    status: String,
    class: &'static str,
}

/// API 状态响应结构
#[derive(Debug, Serialize)]
struct ApiStatusResponse {
    services: Vec<StatusView>,
    generated_at: String,
    total: usize,
    online: usize,
    offline: usize,
}

/// 执行一轮检测，服务器关闭时中止
async fn run_check(state: &WebAppState) -> Snapshot {
    let cancel = state.shutdown.child_token();
    state
        .checker
        .check_all_with_cancel(&state.services, state.probe_timeout, &cancel)
        .await
}

/// 状态页处理函数
pub async fn index(State(state): State<WebAppState>) -> impl IntoResponse {
    let snapshot = run_check(&state).await;

    let services = snapshot
        .views()
        .into_iter()
        .zip(state.services.iter())
        .map(|(view, descriptor)| ServiceRow {
            name: view.name,
            url: view.url,
            description: descriptor.description.clone().unwrap_or_default(),
            status: view.status,
            class: view.class,
        })
        .collect();

    let template = IndexTemplate {
        title: state.config.title.clone(),
        services,
        current_time: snapshot.generated_at_display(),
        online_count: snapshot.online_count(),
        offline_count: snapshot.offline_count(),
    };

    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("模板渲染失败: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "模板渲染失败").into_response()
        }
    }
}

/// API 状态端点处理函数
pub async fn api_status(State(state): State<WebAppState>) -> impl IntoResponse {
    let snapshot = run_check(&state).await;

    Json(ApiStatusResponse {
        total: snapshot.len(),
        online: snapshot.online_count(),
        offline: snapshot.offline_count(),
        generated_at: snapshot.generated_at_display(),
        services: snapshot.views(),
    })
}
