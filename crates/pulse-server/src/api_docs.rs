// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! OpenAPI documentation for pulse-server, served at `/api-docs/openapi.json`.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Pulse Server API",
        version = "1.0.0",
        description = "Notification ledger, live and push delivery, and the request audit trail.",
        license(name = "Proprietary")
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    tags(
        (name = "notifications", description = "Per-user notification ledger"),
        (name = "push", description = "Push subscription registration"),
        (name = "dispatch", description = "Inbound events from resource controllers"),
        (name = "audit", description = "Read-only request audit trail"),
        (name = "live", description = "WebSocket live channel"),
        (name = "health", description = "Health checks and audit queue status")
    ),
    paths(
        // Ledger endpoints
        crate::routes::notifications::list_notifications,
        crate::routes::notifications::unread_count,
        crate::routes::notifications::mark_read,
        crate::routes::notifications::mark_unread,
        crate::routes::notifications::mark_all_read,
        crate::routes::notifications::delete_notification,
        crate::routes::notifications::delete_all_notifications,
        crate::routes::push::subscribe,
        crate::routes::dispatch::dispatch_event,
        crate::routes::audit::list_audit_entries,
        crate::routes::health::health_check,
        crate::websocket::ws_upgrade_handler,
    ),
    components(
        schemas(
            pulse_notify_core::NotificationRecord,
            pulse_notify_core::LocalizedText,
            pulse_notify_core::DispatchEvent,
            pulse_notify_core::PushSubscription,
            pulse_notify_core::PushKeys,
            pulse_server_api::CountResponse,
            pulse_server_api::ErrorResponse,
            pulse_server_api::SubscribeRequest,
            pulse_server_api::SubscribeResponse,
            pulse_server_api::DispatchAcceptedResponse,
            pulse_server_api::AuditEntryResponse,
            pulse_server_api::ListAuditEntriesResponse,
            pulse_server_api::HealthResponse,
            pulse_server_api::HealthStatus,
            pulse_server_api::AuditHealth,
        )
    )
)]
pub struct ApiDoc;
