//! Type-specific task payloads
//!
//! Each task family carries exactly one payload variant.

use serde::{Deserialize, Serialize};

use crate::domain::document::{FieldMapping, ScreenAction, StateTransition};

/// Payload keyed by task family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TaskPayload {
    Database(DatabasePayload),
    Api(ApiPayload),
    Ui(UiPayload),
    Validation(ValidationPayload),
    Workflow(WorkflowPayload),
    Service(ServicePayload),
    ApiClient(ApiClientPayload),
    Environment(EnvironmentPayload),
    Routes(RoutePayload),
    Navigation(NavigationPayload),
    Page(PagePayload),
    Flow(FlowPayload),
    Testing(TestPayload),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub sql_type: String,
    pub nullable: bool,
    pub unique: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeySpec {
    pub column: String,
    pub references_table: String,
    pub references_column: String,
    pub on_delete: String,
    pub on_update: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabasePayload {
    pub table_name: String,
    pub columns: Vec<ColumnSpec>,
    pub primary_key: String,
    pub indexes: Vec<IndexSpec>,
    pub foreign_keys: Vec<ForeignKeySpec>,
    pub audit_columns: bool,
    pub soft_delete: bool,
}

/// CRUD operation an endpoint implements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrudOperation {
    Create,
    List,
    Get,
    Update,
    Delete,
}

impl CrudOperation {
    pub const ALL: [CrudOperation; 5] = [
        CrudOperation::Create,
        CrudOperation::List,
        CrudOperation::Get,
        CrudOperation::Update,
        CrudOperation::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CrudOperation::Create => "create",
            CrudOperation::List => "list",
            CrudOperation::Get => "get",
            CrudOperation::Update => "update",
            CrudOperation::Delete => "delete",
        }
    }

    pub fn http_method(&self) -> &'static str {
        match self {
            CrudOperation::Create => "POST",
            CrudOperation::List | CrudOperation::Get => "GET",
            CrudOperation::Update => "PUT",
            CrudOperation::Delete => "DELETE",
        }
    }

    /// Whether the route addresses a single record
    pub fn targets_record(&self) -> bool {
        matches!(self, CrudOperation::Get | CrudOperation::Update | CrudOperation::Delete)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCode {
    pub status: u16,
    pub meaning: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiPayload {
    pub operation: CrudOperation,
    pub method: String,
    pub route: String,
    pub request_fields: Vec<String>,
    pub response_shape: String,
    pub query_params: Vec<String>,
    pub error_codes: Vec<ErrorCode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiPayload {
    pub screen_id: String,
    pub screen_name: String,
    pub route: String,
    pub layout: String,
    pub fields: Vec<FieldMapping>,
    pub actions: Vec<ScreenAction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationPayload {
    pub rule_id: String,
    pub rule_kind: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    pub conditions: Vec<String>,
    pub error_message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStateSpec {
    pub name: String,
    pub transitions: Vec<StateTransition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowPayload {
    pub states: Vec<WorkflowStateSpec>,
    pub initial_state: String,
    pub final_states: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceMethod {
    pub name: String,
    pub inputs: Vec<String>,
    pub output: String,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePayload {
    pub service_name: String,
    pub methods: Vec<ServiceMethod>,
    /// Services this one calls through outbound relationships
    pub collaborators: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCall {
    pub name: String,
    pub method: String,
    pub route: String,
    pub entity: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiClientPayload {
    pub calls: Vec<ClientCall>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyPin {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentPayload {
    pub components: Vec<String>,
    pub dependencies: Vec<DependencyPin>,
    pub verification_steps: Vec<String>,
    /// Already satisfied by an external provisioning step
    pub provisioned: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    pub path: String,
    pub screen_id: String,
    pub screen_name: String,
    pub component: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutePayload {
    pub routes: Vec<RouteEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavItem {
    pub label: String,
    pub route: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationPayload {
    pub items: Vec<NavItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagePayload {
    pub route: String,
    pub screens: Vec<String>,
    pub steps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestScenario {
    pub name: String,
    pub steps: Vec<String>,
    pub expected: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowPayload {
    pub requirement_id: String,
    pub screens: Vec<String>,
    pub rules: Vec<String>,
    pub scenarios: Vec<TestScenario>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestPayload {
    pub entity: String,
    pub unit: Vec<String>,
    pub integration: Vec<String>,
    pub e2e: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_is_tagged_by_kind() {
        let payload = TaskPayload::Navigation(NavigationPayload {
            items: vec![NavItem {
                label: "Orders".into(),
                route: "/orders".into(),
            }],
        });
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["kind"], "navigation");
        assert_eq!(json["items"][0]["route"], "/orders");
    }

    #[test]
    fn test_crud_operation_methods() {
        assert_eq!(CrudOperation::Create.http_method(), "POST");
        assert_eq!(CrudOperation::Update.http_method(), "PUT");
        assert!(CrudOperation::Delete.targets_record());
        assert!(!CrudOperation::List.targets_record());
    }
}
