use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{router::tool::ToolRouter, tool::Parameters},
    model::*,
    tool, tool_handler, tool_router,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::format::{format_activities, format_catalogs, format_filters, format_notices};
use crate::activity::ActivityStore;
use crate::filter::{DateBound, Dimension, TypeOption, UserOption};
use crate::view::{ActivityViewModel, NoticeLog, ViewError};

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct DateRequest {
    /// Local date and time as YYYY/MM/DD HH:mm; empty clears the bound
    #[serde(default)]
    pub date: String,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct SelectTypesRequest {
    /// Activity type names from the type catalog in selection order; empty clears the filter
    #[serde(default)]
    pub names: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct SelectUsersRequest {
    /// User ids from the user catalog in selection order; empty clears the filter
    #[serde(default)]
    pub user_ids: Vec<u64>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct RemoveFilterRequest {
    /// One of start_date, end_date, type, username
    pub filter: String,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct ShowActivitiesRequest {
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// "text" (default) or "json"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct ShowNotificationsRequest {
    #[serde(default = "default_notice_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

fn default_notice_limit() -> usize {
    20
}

fn describe_bound(label: &str, bound: DateBound) -> String {
    if bound.is_set() {
        format!("{label} set to {bound}")
    } else {
        format!("{label} cleared")
    }
}

/// MCP tool surface over a single activity view session.
#[derive(Clone)]
pub struct ActivityServer {
    pub(crate) view: Arc<ActivityViewModel>,
    pub(crate) store: ActivityStore,
    pub(crate) notices: Arc<NoticeLog>,
    tool_router: ToolRouter<ActivityServer>,
}

#[tool_router]
impl ActivityServer {
    pub fn new(view: Arc<ActivityViewModel>, store: ActivityStore, notices: Arc<NoticeLog>) -> Self {
        Self {
            view,
            store,
            notices,
            tool_router: Self::tool_router(),
        }
    }

    async fn date_result(
        &self,
        label: &str,
        result: Result<DateBound, ViewError>,
    ) -> Result<CallToolResult, McpError> {
        match result {
            Ok(bound) => {
                let filters = format_filters(&self.view.filter_state().await);
                Ok(CallToolResult::success(vec![Content::text(format!(
                    "{}\n{filters}",
                    describe_bound(label, bound)
                ))]))
            }
            Err(e) => Ok(CallToolResult::error(vec![Content::text(format!(
                "{e}. {label} cleared."
            ))])),
        }
    }

    async fn filters_result(&self) -> Result<CallToolResult, McpError> {
        let filters = format_filters(&self.view.filter_state().await);
        Ok(CallToolResult::success(vec![Content::text(filters)]))
    }

    #[tool(description = "Set the start of the activity time range (YYYY/MM/DD HH:mm)")]
    async fn set_start_date(
        &self,
        Parameters(req): Parameters<DateRequest>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!("set_start_date called with '{}'", req.date);
        let result = self.view.set_start_date(&req.date).await;
        self.date_result("Start date", result).await
    }

    #[tool(description = "Set the end of the activity time range (YYYY/MM/DD HH:mm)")]
    async fn set_end_date(
        &self,
        Parameters(req): Parameters<DateRequest>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!("set_end_date called with '{}'", req.date);
        let result = self.view.set_end_date(&req.date).await;
        self.date_result("End date", result).await
    }

    #[tool(description = "Set the end of the activity time range to the current time")]
    async fn set_end_to_now(&self) -> Result<CallToolResult, McpError> {
        let result = self.view.set_end_to_now().await;
        self.date_result("End date", result).await
    }

    #[tool(description = "Filter by activity types, replacing any previous type selection")]
    async fn select_types(
        &self,
        Parameters(req): Parameters<SelectTypesRequest>,
    ) -> Result<CallToolResult, McpError> {
        let catalog = self.view.type_catalog().await;
        let items = req
            .names
            .iter()
            .map(|name| {
                catalog
                    .iter()
                    .find(|option| option.name == *name)
                    .cloned()
                    .ok_or_else(|| {
                        McpError::invalid_params(
                            format!("Activity type '{name}' is not in the type catalog"),
                            None,
                        )
                    })
            })
            .collect::<Result<Vec<TypeOption>, McpError>>()?;

        self.view.apply_type_selection(&items).await;
        self.filters_result().await
    }

    #[tool(description = "Filter by users, replacing any previous user selection")]
    async fn select_users(
        &self,
        Parameters(req): Parameters<SelectUsersRequest>,
    ) -> Result<CallToolResult, McpError> {
        let catalog = self.view.user_catalog().await;
        let items = req
            .user_ids
            .iter()
            .map(|&id| {
                catalog
                    .iter()
                    .find(|user| user.user_id.inner() == id)
                    .cloned()
                    .ok_or_else(|| {
                        McpError::invalid_params(
                            format!("User id {id} is not in the user catalog"),
                            None,
                        )
                    })
            })
            .collect::<Result<Vec<UserOption>, McpError>>()?;

        self.view.apply_user_selection(&items).await;
        self.filters_result().await
    }

    #[tool(description = "Remove one filter: start_date, end_date, type or username")]
    async fn remove_filter(
        &self,
        Parameters(req): Parameters<RemoveFilterRequest>,
    ) -> Result<CallToolResult, McpError> {
        let dimension: Dimension = req
            .filter
            .parse()
            .map_err(|e: String| McpError::invalid_params(e, None))?;
        self.view.remove_filter(dimension).await;
        self.filters_result().await
    }

    #[tool(description = "Fetch user activity matching the current filters")]
    async fn apply_filters(&self) -> Result<CallToolResult, McpError> {
        match self.view.apply_filters().await {
            Ok(count) => Ok(CallToolResult::success(vec![Content::text(format!(
                "Fetched {count} activity records.\n"
            ))])),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(format!(
                "{e}. Previously displayed activity is unchanged.\n"
            ))])),
        }
    }

    #[tool(description = "Show the displayed user activity, most recent first")]
    async fn show_activities(
        &self,
        Parameters(req): Parameters<ShowActivitiesRequest>,
    ) -> Result<CallToolResult, McpError> {
        let records = self.view.activities().await;

        let content = match req.format.as_deref().map(str::trim) {
            Some("json") => {
                let shown: Vec<_> = records.iter().take(req.limit).collect();
                Content::text(
                    serde_json::to_string_pretty(&shown)
                        .unwrap_or_else(|e| format!("Failed to serialize activity: {e}")),
                )
            }
            _ => Content::text(format_activities(&records, req.limit)),
        };

        Ok(CallToolResult::success(vec![content]))
    }

    #[tool(description = "Show the active filters")]
    async fn show_filters(&self) -> Result<CallToolResult, McpError> {
        self.filters_result().await
    }

    #[tool(description = "List the users and activity types available for filtering")]
    async fn show_catalogs(&self) -> Result<CallToolResult, McpError> {
        let users = self.view.user_catalog().await;
        let types = self.view.type_catalog().await;
        Ok(CallToolResult::success(vec![Content::text(format_catalogs(
            &users, &types,
        ))]))
    }

    #[tool(description = "Show recent notifications, newest first")]
    async fn show_notifications(
        &self,
        Parameters(req): Parameters<ShowNotificationsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let notices = self.notices.recent(Some(req.limit));
        Ok(CallToolResult::success(vec![Content::text(format_notices(
            &notices,
        ))]))
    }

    #[tool(description = "Discard the notification history")]
    async fn clear_notifications(&self) -> Result<CallToolResult, McpError> {
        let cleared = self.notices.count();
        self.notices.clear();
        tracing::info!("Cleared {cleared} notifications");
        Ok(CallToolResult::success(vec![Content::text(format!(
            "Cleared {cleared} notifications.\n"
        ))]))
    }
}

#[tool_handler]
impl ServerHandler for ActivityServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "activity-view".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: Some(
                "User activity audit log viewer. Narrow the log with set_start_date, set_end_date, select_types and select_users, then call apply_filters and show_activities."
                    .to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::ActivityData;
    use crate::view::{
        BusyCounter, Collaborators, FeatureGrants, NoticeKind, Notifier, SystemClock,
    };
    use std::time::Duration;

    async fn server() -> ActivityServer {
        let store = ActivityStore::new();
        store
            .replace(ActivityData {
                activities: vec![serde_json::json!({"activityTime": 1_000, "activityType": "LOGIN"})],
                users: vec![UserOption::new(1, "admin")],
                types: vec![TypeOption::new("LOGIN"), TypeOption::new("LOGOUT")],
            })
            .await;

        let notices = Arc::new(NoticeLog::default());
        let collaborators = Collaborators {
            service: Arc::new(store.clone()),
            notifier: notices.clone(),
            busy: Arc::new(BusyCounter::default()),
            clock: Arc::new(SystemClock),
        };
        let view = ActivityViewModel::enter(
            &FeatureGrants::new(["menu_user_activity"]),
            collaborators,
            Duration::from_secs(5),
        )
        .unwrap();
        view.initialize().await.unwrap();

        ActivityServer::new(Arc::new(view), store, notices)
    }

    #[tokio::test]
    async fn test_select_types_accepts_catalog_names() {
        let server = server().await;
        let req = SelectTypesRequest {
            names: vec!["LOGOUT".to_string(), "LOGIN".to_string()],
        };
        assert!(server.select_types(Parameters(req)).await.is_ok());

        let state = server.view.filter_state().await;
        assert_eq!(state.types().display(), "LOGOUT,LOGIN");
    }

    #[tokio::test]
    async fn test_select_types_rejects_unknown_name() {
        let server = server().await;
        server
            .select_types(Parameters(SelectTypesRequest {
                names: vec!["LOGIN".to_string()],
            }))
            .await
            .unwrap();

        let req = SelectTypesRequest {
            names: vec!["LOGIN".to_string(), "DELETE_FLOW".to_string()],
        };
        assert!(server.select_types(Parameters(req)).await.is_err());

        // The previous selection survives a rejected request
        let state = server.view.filter_state().await;
        assert_eq!(state.types().names(), ["LOGIN"]);
    }

    #[tokio::test]
    async fn test_select_users_rejects_unknown_id() {
        let server = server().await;
        let req = SelectUsersRequest { user_ids: vec![99] };
        assert!(server.select_users(Parameters(req)).await.is_err());
        assert!(!server.view.filter_flags().await.show_username_filter);

        let req = SelectUsersRequest { user_ids: vec![1] };
        assert!(server.select_users(Parameters(req)).await.is_ok());
        assert_eq!(server.view.filter_state().await.users().display(), "admin");
    }

    #[tokio::test]
    async fn test_clear_notifications() {
        let server = server().await;
        server.notices.notify(NoticeKind::Error, "No user activity found");
        server.notices.notify(NoticeKind::Info, "Activity data reloaded");

        let result = server.clear_notifications().await.unwrap();
        assert_ne!(result.is_error, Some(true));
        assert_eq!(server.notices.count(), 0);
    }
}
