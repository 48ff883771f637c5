//! Client region to document namespace mapping.
//!
//! The official and Bilibili clients share the default namespace; every other
//! client additionally gets its own regional task document.

/// Client whose documents double as the fallback for every region
pub const DEFAULT_CLIENT: &str = "Official";

/// Activity schedule document
pub const STAGE_ACTIVITY_PATH: &str = "gui/StageActivityV2.json";

/// Primary task-definition document
pub const TASKS_PATH: &str = "resource/tasks.json";

/// Documents a sync pass fetches for one client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    pub client: String,
    pub activity_path: String,
    /// Primary task document first, regional one after it when present
    pub task_paths: Vec<String>,
}

impl Namespace {
    pub fn is_default(&self) -> bool {
        self.client == DEFAULT_CLIENT
    }
}

/// Collapse client variants that share resources.
pub fn effective_client(client_type: &str) -> &str {
    match client_type.trim() {
        "" | "Bilibili" => DEFAULT_CLIENT,
        other => other,
    }
}

pub fn global_tasks_path(client: &str) -> String {
    format!("resource/global/{}/resource/tasks.json", client)
}

pub fn namespace_for(client_type: &str) -> Namespace {
    let client = effective_client(client_type);
    let mut task_paths = vec![TASKS_PATH.to_string()];
    if client != DEFAULT_CLIENT {
        task_paths.push(global_tasks_path(client));
    }

    Namespace {
        client: client.to_string(),
        activity_path: STAGE_ACTIVITY_PATH.to_string(),
        task_paths,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_clients() {
        for client in ["", "  ", "Bilibili", "Official"] {
            let ns = namespace_for(client);
            assert!(ns.is_default(), "{client:?} should map to default");
            assert_eq!(ns.task_paths, vec![TASKS_PATH.to_string()]);
        }
    }

    #[test]
    fn test_regional_client_adds_global_tasks() {
        let ns = namespace_for("YoStarEN");
        assert_eq!(ns.client, "YoStarEN");
        assert!(!ns.is_default());
        assert_eq!(
            ns.task_paths,
            vec![
                "resource/tasks.json".to_string(),
                "resource/global/YoStarEN/resource/tasks.json".to_string(),
            ]
        );
        assert_eq!(ns.activity_path, STAGE_ACTIVITY_PATH);
    }
}
