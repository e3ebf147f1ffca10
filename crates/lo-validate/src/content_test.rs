use super::*;
use crate::test_utils::StubPlatform;
use lo_api::{ContentId, ContentValidation, ContentValidatorError, FolderRef, TileDetails};
use lo_core::ModelName;

fn model() -> Model {
    Model {
        name: ModelName::new("ecommerce"),
        explores: Vec::new(),
    }
}

fn broken(model: &str) -> ContentValidatorError {
    ContentValidatorError {
        model_name: model.to_string(),
        explore_name: "orders".to_string(),
        message: "Explore not found".to_string(),
        field_name: None,
    }
}

fn look(id: &str, folder_id: Option<&str>, errors: Vec<ContentValidatorError>) -> ContentItem {
    ContentItem {
        look: Some(ContentDetails {
            id: ContentId::Text(id.to_string()),
            title: Some("Weekly Revenue".to_string()),
            folder: folder_id.map(|id| FolderRef {
                id: Some(id.to_string()),
                name: Some("Shared".to_string()),
            }),
        }),
        dashboard: None,
        dashboard_element: None,
        dashboard_filter: None,
        errors,
    }
}

fn dashboard(id: i64, folder_id: Option<&str>, errors: Vec<ContentValidatorError>) -> ContentItem {
    ContentItem {
        look: None,
        dashboard: Some(ContentDetails {
            id: ContentId::Number(id),
            title: Some("Orders Overview".to_string()),
            folder: folder_id.map(|id| FolderRef {
                id: Some(id.to_string()),
                name: Some("Shared".to_string()),
            }),
        }),
        dashboard_element: Some(TileDetails {
            title: Some("Orders by Day".to_string()),
        }),
        dashboard_filter: None,
        errors,
    }
}

fn folder(id: &str, parent: Option<&str>) -> Folder {
    Folder {
        id: id.to_string(),
        name: Some(format!("Folder {}", id)),
        parent_id: parent.map(String::from),
        is_personal: false,
        is_personal_descendant: false,
    }
}

fn validator(api: &Arc<StubPlatform>, exclude_personal: bool, folders: &[String]) -> ContentValidator {
    ContentValidator::new(
        Arc::clone(api) as Arc<dyn PlatformClient>,
        exclude_personal,
        folders,
    )
}

#[tokio::test]
async fn test_look_errors_scoped_to_model() {
    let api = Arc::new(StubPlatform::new());
    api.set_content(ContentValidation {
        content_with_errors: vec![look(
            "11",
            Some("1"),
            vec![broken("ecommerce"), broken("warehouse")],
        )],
    });

    let errors = validator(&api, false, &[]).validate(&model()).await.unwrap();

    assert_eq!(errors.len(), 1);
    let error = &errors[0];
    assert_eq!(error.model, "ecommerce");
    assert_eq!(error.explore, "orders");
    assert_eq!(error.message, "Explore not found");
    assert_eq!(error.content_type, ContentKind::Look);
    assert_eq!(error.title.as_deref(), Some("Weekly Revenue"));
    assert_eq!(error.folder.as_deref(), Some("Shared"));
    assert_eq!(error.url, "https://bi.example.com/looks/11");
    assert_eq!(error.tile_type, None);
}

#[tokio::test]
async fn test_dashboard_errors_carry_tile_details() {
    let api = Arc::new(StubPlatform::new());
    api.set_content(ContentValidation {
        content_with_errors: vec![dashboard(42, Some("1"), vec![broken("ecommerce")])],
    });

    let errors = validator(&api, false, &[]).validate(&model()).await.unwrap();

    assert_eq!(errors.len(), 1);
    let error = &errors[0];
    assert_eq!(error.content_type, ContentKind::Dashboard);
    assert_eq!(error.url, "https://bi.example.com/dashboards/42");
    assert_eq!(error.tile_type, Some(TileKind::DashboardElement));
    assert_eq!(error.tile_title.as_deref(), Some("Orders by Day"));
}

#[tokio::test]
async fn test_filter_tile_reported_as_filter() {
    let api = Arc::new(StubPlatform::new());
    let mut item = dashboard(42, None, vec![broken("ecommerce")]);
    item.dashboard_element = None;
    item.dashboard_filter = Some(TileDetails {
        title: Some("Date Range".to_string()),
    });
    api.set_content(ContentValidation {
        content_with_errors: vec![item],
    });

    let errors = validator(&api, false, &[]).validate(&model()).await.unwrap();

    assert_eq!(errors[0].tile_type, Some(TileKind::DashboardFilter));
    assert_eq!(errors[0].tile_title.as_deref(), Some("Date Range"));
}

#[tokio::test]
async fn test_repeated_error_reported_once() {
    let api = Arc::new(StubPlatform::new());
    // The sweep lists the dashboard once per broken tile.
    api.set_content(ContentValidation {
        content_with_errors: vec![
            dashboard(42, Some("1"), vec![broken("ecommerce")]),
            dashboard(42, Some("1"), vec![broken("ecommerce")]),
        ],
    });

    let errors = validator(&api, false, &[]).validate(&model()).await.unwrap();

    assert_eq!(errors.len(), 1);
}

#[tokio::test]
async fn test_content_without_look_or_dashboard_skipped() {
    let api = Arc::new(StubPlatform::new());
    let mut item = look("11", None, vec![broken("ecommerce")]);
    item.look = None;
    api.set_content(ContentValidation {
        content_with_errors: vec![item],
    });

    let errors = validator(&api, false, &[]).validate(&model()).await.unwrap();

    assert!(errors.is_empty());
}

#[tokio::test]
async fn test_personal_folders_excluded() {
    let api = Arc::new(StubPlatform::new());
    api.set_folders(vec![
        folder("1", None),
        Folder {
            is_personal: true,
            ..folder("2", None)
        },
        Folder {
            is_personal_descendant: true,
            ..folder("3", Some("2"))
        },
    ]);
    api.set_content(ContentValidation {
        content_with_errors: vec![
            look("11", Some("1"), vec![broken("ecommerce")]),
            look("12", Some("2"), vec![broken("ecommerce")]),
            look("13", Some("3"), vec![broken("ecommerce")]),
        ],
    });

    let errors = validator(&api, true, &[]).validate(&model()).await.unwrap();

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].url, "https://bi.example.com/looks/11");
}

#[tokio::test]
async fn test_folder_selection_extends_to_subfolders() {
    let api = Arc::new(StubPlatform::new());
    api.set_folders(vec![
        folder("1", None),
        folder("2", Some("1")),
        folder("3", Some("2")),
        folder("9", None),
    ]);
    api.set_content(ContentValidation {
        content_with_errors: vec![
            look("11", Some("3"), vec![broken("ecommerce")]),
            look("12", Some("9"), vec![broken("ecommerce")]),
        ],
    });

    let errors = validator(&api, false, &["1".to_string()])
        .validate(&model())
        .await
        .unwrap();

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].url, "https://bi.example.com/looks/11");
}

#[tokio::test]
async fn test_folder_exclusion_wins_over_inclusion() {
    let api = Arc::new(StubPlatform::new());
    api.set_folders(vec![
        folder("1", None),
        folder("2", Some("1")),
        folder("3", Some("2")),
    ]);
    api.set_content(ContentValidation {
        content_with_errors: vec![
            look("11", Some("1"), vec![broken("ecommerce")]),
            look("12", Some("3"), vec![broken("ecommerce")]),
        ],
    });

    let errors = validator(&api, false, &["1".to_string(), "-2".to_string()])
        .validate(&model())
        .await
        .unwrap();

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].url, "https://bi.example.com/looks/11");
}

#[tokio::test]
async fn test_unknown_folder_is_discovery_error() {
    let api = Arc::new(StubPlatform::new());
    api.set_folders(vec![folder("1", None)]);
    api.set_content(ContentValidation {
        content_with_errors: Vec::new(),
    });

    let result = validator(&api, false, &["404".to_string()])
        .validate(&model())
        .await;

    match result {
        Err(ValidateError::Discovery(message)) => {
            assert_eq!(message, "folder '404' does not exist on the platform")
        }
        other => panic!("expected a discovery error, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_orphaned_content_kept_without_folder_selection() {
    let api = Arc::new(StubPlatform::new());
    api.set_content(ContentValidation {
        content_with_errors: vec![look("11", None, vec![broken("ecommerce")])],
    });

    let errors = validator(&api, false, &[]).validate(&model()).await.unwrap();

    assert_eq!(errors.len(), 1);

    // A folder selection drops content that no longer has a folder.
    api.set_folders(vec![folder("1", None)]);
    let errors = validator(&api, false, &["1".to_string()])
        .validate(&model())
        .await
        .unwrap();
    assert!(errors.is_empty());
}
