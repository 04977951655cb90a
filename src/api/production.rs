//! MES production endpoints.

use serde_json::Value;

use crate::api::client::{ApiClient, ListQuery};
use crate::api::error::ApiError;
use crate::api::resource::Resource;
use crate::mes::{PanelContext, ProductionBackend};
use crate::models::{
    MachineGroup, MachineStatus, Operation, OperationLogEntry, Order, ReorderOperations, Task,
    Workstation, WorkstationStatusUpdate, decode_rows,
};

impl ApiClient {
    pub fn operations(&self) -> Result<Vec<Operation>, ApiError> {
        self.typed_rows(Resource::Operations, "operation")
    }

    pub fn tasks(&self) -> Result<Vec<Task>, ApiError> {
        self.typed_rows(Resource::Tasks, "task")
    }

    pub fn orders(&self) -> Result<Vec<Order>, ApiError> {
        self.typed_rows(Resource::Orders, "order")
    }

    pub fn workstations(&self) -> Result<Vec<Workstation>, ApiError> {
        self.typed_rows(Resource::Workstations, "workstation")
    }

    pub fn machine_statuses(&self) -> Result<Vec<MachineStatus>, ApiError> {
        self.typed_rows(Resource::MachineStatuses, "machine status")
    }

    pub fn machine_groups(&self) -> Result<Vec<MachineGroup>, ApiError> {
        self.typed_rows(Resource::MachineGroups, "machine group")
    }

    /// Everything the machine panel needs for `operation_id`, or `None` when
    /// the operation does not exist.
    pub fn load_panel_context(&self, operation_id: i64) -> Result<Option<PanelContext>, ApiError> {
        let operations = self.operations()?;
        let tasks = self.tasks()?;
        let orders = self.orders()?;
        let workstations = self.workstations()?;
        let statuses = self.machine_statuses()?;
        let context =
            PanelContext::resolve(operation_id, operations, tasks, orders, workstations, statuses);
        if context.is_none() {
            tracing::warn!("Operation {operation_id} not found");
        }
        Ok(context)
    }

    /// Persist a new operation order on a workstation.
    pub fn reorder_operations(&self, operation_ids: Vec<i64>) -> Result<(), ApiError> {
        let body = ReorderOperations { operation_ids };
        let _: Value = self.send_json("POST", "production/operations/reorder", &body, true)?;
        Ok(())
    }

    fn typed_rows<T: serde::de::DeserializeOwned>(
        &self,
        resource: Resource,
        what: &str,
    ) -> Result<Vec<T>, ApiError> {
        let rows = self.list(resource, &ListQuery::for_resource(resource))?;
        Ok(decode_rows(rows, what))
    }
}

impl ProductionBackend for ApiClient {
    fn update_workstation(
        &self,
        workstation_id: i64,
        update: &WorkstationStatusUpdate,
    ) -> Result<(), ApiError> {
        let path = Resource::Workstations.item_path(&workstation_id.to_string());
        let _: Value = self.send_json("PUT", &path, update, true)?;
        Ok(())
    }

    fn create_log(&self, entry: &OperationLogEntry) -> Result<(), ApiError> {
        let _: Value = self.send_json("POST", Resource::ProductionLogs.collection_path(), entry, true)?;
        Ok(())
    }

    fn recalculate_operation(&self, operation_id: i64) -> Result<(), ApiError> {
        let path = format!("production/operations/{operation_id}/recalculate");
        self.post_empty(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::test_server::{json_response, serve};
    use crate::session::{MemorySessionStore, Session};
    use std::sync::Arc;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(base, Arc::new(MemorySessionStore::with_session(Session::new("tok"))))
            .unwrap()
    }

    #[test]
    fn loads_panel_context_from_five_lists() {
        let (base, requests) = serve(vec![
            json_response(200, r#"[{"id":3,"task_id":5,"workstation_id":2,"duration_total_min":1.5}]"#),
            json_response(200, r#"{"items":[{"id":5,"order_id":8}]}"#),
            json_response(200, r#"[{"id":8,"order_number":"ZP/8"}]"#),
            json_response(200, r#"[{"id":2,"name":"Lathe","status_id":4}]"#),
            json_response(200, r#"[{"id":4,"status_no":5,"name":"Koniec operacji"}]"#),
        ]);
        let context = client(&base).load_panel_context(3).unwrap().unwrap();
        assert_eq!(context.task.map(|task| task.id), Some(5));
        assert_eq!(context.order.map(|order| order.id), Some(8));
        assert_eq!(context.workstation.map(|ws| ws.status_id), Some(Some(4)));
        let paths: Vec<String> = requests
            .try_iter()
            .map(|request| request.split(' ').nth(1).unwrap_or_default().to_string())
            .collect();
        assert_eq!(
            paths,
            vec![
                "/production/operations",
                "/production/tasks",
                "/production/orders",
                "/production/workstations",
                "/production/machine-statuses",
            ]
        );
    }

    #[test]
    fn loads_panel_context_with_decimal_strings() {
        let (base, _requests) = serve(vec![
            json_response(200, r#"[{"id":"3","task_id":"5","workstation_id":2,"duration_total_min":"10.50"}]"#),
            json_response(200, r#"[{"id":5,"order_id":8,"detail_number":1402}]"#),
            json_response(200, r#"[{"id":8,"order_number":77}]"#),
            json_response(200, r#"[{"id":2,"name":"Lathe","status_id":"4"}]"#),
            json_response(200, r#"[{"id":4,"status_no":"1","name":"Praca"}]"#),
        ]);
        let context = client(&base).load_panel_context(3).unwrap().unwrap();
        assert_eq!(context.operation.duration_total_min, Some(10.5));
        assert_eq!(context.order_label(), "77 | — | —");
        assert_eq!(context.task.and_then(|task| task.detail_number).as_deref(), Some("1402"));
        assert_eq!(context.workstation.and_then(|ws| ws.status_id), Some(4));
    }

    #[test]
    fn backend_calls_hit_production_endpoints() {
        let (base, requests) = serve(vec![
            json_response(200, "{}"),
            json_response(201, r#"{"id":1}"#),
            json_response(200, "{}"),
        ]);
        let client = client(&base);
        client
            .update_workstation(
                2,
                &WorkstationStatusUpdate {
                    name: "Lathe".into(),
                    cost_center: None,
                    status_id: 4,
                    current_task_id: Some(5),
                    user_id: Some(1),
                },
            )
            .unwrap();
        client
            .create_log(&OperationLogEntry {
                operation_id: 3,
                status_id: 4,
                workstation_id: 2,
                user_id: Some(1),
                note: "Praca".into(),
            })
            .unwrap();
        client.recalculate_operation(3).unwrap();

        let put = requests.recv().unwrap();
        assert!(put.starts_with("PUT /production/workstations/2 "));
        assert!(put.contains(r#""current_task_id":5"#));
        let log = requests.recv().unwrap();
        assert!(log.starts_with("POST /production/logs "));
        assert!(log.contains(r#""note":"Praca""#));
        assert!(requests.recv().unwrap().starts_with("POST /production/operations/3/recalculate "));
    }
}
