//! Iteration lifecycle tests
//!
//! Create/lookup/update/delete flows for iterations, including chart
//! validation failures (which must surface their stable messages and leave
//! no partial state) and image chart encoding.

use mltrack_db::entity::{
    ChartType, ChartValue, ExperimentDraft, ImageChartDraft, InteractiveChart, IterationDraft,
    IterationPatch, ProjectDraft,
};
use mltrack_db::{image, Tracker};
use std::collections::HashMap;
use std::io::Write;

async fn seed_tree(tracker: &Tracker) -> (String, String) {
    let project = tracker
        .create_project(ProjectDraft {
            title: "Test project".to_string(),
            description: "Test project description".to_string(),
        })
        .await
        .unwrap();
    let experiment = tracker
        .create_experiment(
            project.id(),
            ExperimentDraft {
                name: "Test experiment".to_string(),
                description: "Test experiment description".to_string(),
            },
        )
        .await
        .unwrap();
    (project.id().to_string(), experiment.id().to_string())
}

fn basic_draft(name: &str) -> IterationDraft {
    IterationDraft {
        iteration_name: name.to_string(),
        metrics: HashMap::from([
            ("accuracy".to_string(), 0.8),
            ("precision".to_string(), 0.7),
        ]),
        parameters: HashMap::from([("batch_size".to_string(), serde_json::json!(32))]),
        model_name: "Test model name".to_string(),
        ..Default::default()
    }
}

fn line_chart(name: &str, x: Vec<ChartValue>, y: Vec<ChartValue>) -> InteractiveChart {
    InteractiveChart {
        chart_name: name.to_string(),
        chart_type: ChartType::Line,
        x_data: x,
        y_data: y,
        x_label: "Shot number".to_string(),
        y_label: "Points".to_string(),
    }
}

#[tokio::test]
async fn test_empty_experiment_has_no_iterations() {
    let tracker = Tracker::new();
    let (_, experiment_id) = seed_tree(&tracker).await;

    let iterations = tracker.list_iterations(&experiment_id).await.unwrap();
    assert!(iterations.is_empty());
}

#[tokio::test]
async fn test_add_iteration_caches_ancestor_names() {
    let tracker = Tracker::new();
    let (_, experiment_id) = seed_tree(&tracker).await;

    let iteration = tracker
        .create_iteration(&experiment_id, basic_draft("Test iteration"))
        .await
        .unwrap();

    assert_eq!(iteration.iteration_name(), "Test iteration");
    assert_eq!(iteration.project_title(), "Test project");
    assert_eq!(iteration.experiment_name(), "Test experiment");
    assert!(iteration.dataset().is_none());
    assert!(iteration.path_to_model().is_none());
}

#[tokio::test]
async fn test_add_iteration_with_path_to_model() {
    let tracker = Tracker::new();
    let (_, experiment_id) = seed_tree(&tracker).await;

    let mut draft = basic_draft("Test iteration 2");
    draft.path_to_model = Some("/models/test_iteration_file.pkl".to_string());

    let iteration = tracker
        .create_iteration(&experiment_id, draft)
        .await
        .unwrap();
    assert_eq!(
        iteration.path_to_model(),
        Some("/models/test_iteration_file.pkl")
    );
}

#[tokio::test]
async fn test_list_and_lookup_by_name() {
    let tracker = Tracker::new();
    let (_, experiment_id) = seed_tree(&tracker).await;

    tracker
        .create_iteration(&experiment_id, basic_draft("Test iteration"))
        .await
        .unwrap();
    tracker
        .create_iteration(&experiment_id, basic_draft("Test iteration"))
        .await
        .unwrap();
    tracker
        .create_iteration(&experiment_id, basic_draft("Other"))
        .await
        .unwrap();

    assert_eq!(tracker.list_iterations(&experiment_id).await.unwrap().len(), 3);

    // Names are not unique; lookup returns every match
    let named = tracker
        .iterations_by_name(&experiment_id, "Test iteration")
        .await
        .unwrap();
    assert_eq!(named.len(), 2);
    assert!(named.iter().all(|i| i.iteration_name() == "Test iteration"));
}

#[tokio::test]
async fn test_change_iteration_name() {
    let tracker = Tracker::new();
    let (_, experiment_id) = seed_tree(&tracker).await;

    let iteration = tracker
        .create_iteration(&experiment_id, basic_draft("Test iteration to change"))
        .await
        .unwrap();

    let updated = tracker
        .update_iteration(
            iteration.id(),
            IterationPatch {
                iteration_name: Some("Changed iteration name".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.iteration_name(), "Changed iteration name");

    let fetched = tracker.iteration(iteration.id()).await.unwrap();
    assert_eq!(fetched.iteration_name(), "Changed iteration name");
}

#[tokio::test]
async fn test_delete_iteration_by_id() {
    let tracker = Tracker::new();
    let (_, experiment_id) = seed_tree(&tracker).await;

    let iteration = tracker
        .create_iteration(&experiment_id, basic_draft("Test iteration"))
        .await
        .unwrap();

    tracker.delete_iteration(iteration.id()).await.unwrap();
    assert!(tracker.iteration(iteration.id()).await.unwrap_err().is_not_found());

    // Deleting again is a lookup failure, not a crash
    assert!(tracker
        .delete_iteration(iteration.id())
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn test_add_iteration_with_chart() {
    let tracker = Tracker::new();
    let (_, experiment_id) = seed_tree(&tracker).await;

    let mut draft = basic_draft("Test iteration");
    draft.interactive_charts = vec![line_chart(
        "Test chart 1",
        vec![1.0.into(), 2.0.into(), 3.0.into(), 4.0.into(), 5.0.into()],
        vec![8.0.into(), 2.0.into(), 30.0.into(), 4.0.into(), 10.0.into()],
    )];

    let iteration = tracker
        .create_iteration(&experiment_id, draft)
        .await
        .unwrap();
    assert_eq!(iteration.interactive_charts().len(), 1);
    assert_eq!(iteration.interactive_charts()[0].chart_name, "Test chart 1");
}

#[tokio::test]
async fn test_add_iteration_with_string_chart_values() {
    let tracker = Tracker::new();
    let (_, experiment_id) = seed_tree(&tracker).await;

    let mut draft = basic_draft("Test iteration");
    draft.interactive_charts = vec![InteractiveChart {
        chart_name: "Test chart with string values".to_string(),
        chart_type: ChartType::Bar,
        x_data: vec!["height".into(), "width".into(), "length".into()],
        y_data: vec![180.0.into(), 79.0.into(), 100.0.into()],
        x_label: "String labels".to_string(),
        y_label: "Values".to_string(),
    }];

    let iteration = tracker
        .create_iteration(&experiment_id, draft)
        .await
        .unwrap();
    assert_eq!(iteration.interactive_charts().len(), 1);
}

#[tokio::test]
async fn test_duplicated_chart_names_rejected_without_partial_write() {
    let tracker = Tracker::new();
    let (_, experiment_id) = seed_tree(&tracker).await;

    let mut draft = basic_draft("Test iteration with duplicated chart names");
    draft.interactive_charts = vec![
        line_chart("Test chart 1", vec![1.0.into()], vec![8.0.into()]),
        line_chart("Test chart 1", vec![20.0.into()], vec![8.0.into()]),
    ];

    let err = tracker
        .create_iteration(&experiment_id, draft)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Chart names in iteration must be unique");

    assert!(tracker.list_iterations(&experiment_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_mismatched_series_lengths_rejected() {
    let tracker = Tracker::new();
    let (_, experiment_id) = seed_tree(&tracker).await;

    let mut draft = basic_draft("Test iteration with different amounts of x and y");
    draft.interactive_charts = vec![line_chart(
        "Test chart 1",
        vec![1.0.into(), 2.0.into(), 3.0.into()],
        vec![
            8.0.into(),
            2.0.into(),
            30.0.into(),
            4.0.into(),
            10.0.into(),
            12.0.into(),
        ],
    )];

    let err = tracker
        .create_iteration(&experiment_id, draft)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Number of x_data and y_data must be the same for the selected chart type"
    );
}

#[tokio::test]
async fn test_image_chart_encodes_source_bytes() {
    let tracker = Tracker::new();
    let (_, experiment_id) = seed_tree(&tracker).await;

    // PNG magic followed by non-UTF8 payload
    let payload: Vec<u8> = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0xff, 0x00]
        .into_iter()
        .chain((0u8..=255).rev())
        .collect();
    let mut source = tempfile::NamedTempFile::new().unwrap();
    source.write_all(&payload).unwrap();

    let mut draft = basic_draft("Test iteration");
    draft.image_charts = vec![ImageChartDraft {
        name: "Test chart 1".to_string(),
        image_path: source.path().to_string_lossy().into_owned(),
    }];

    let iteration = tracker
        .create_iteration(&experiment_id, draft)
        .await
        .unwrap();

    let chart = &iteration.image_charts()[0];
    assert_eq!(chart.name, "Test chart 1");
    assert!(!chart.encoded_image.is_empty());
    assert_eq!(
        image::from_persisted_form(&chart.encoded_image).unwrap(),
        payload
    );
}

#[tokio::test]
async fn test_image_chart_with_invalid_path() {
    let tracker = Tracker::new();
    let (_, experiment_id) = seed_tree(&tracker).await;

    let mut draft = basic_draft("Test iteration");
    draft.image_charts = vec![ImageChartDraft {
        name: "Test chart invalid".to_string(),
        image_path: "/invalid_folder/invalid_image.png".to_string(),
    }];

    let err = tracker
        .create_iteration(&experiment_id, draft)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Image path does not exist.");

    assert!(tracker.list_iterations(&experiment_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_iteration_under_unknown_experiment() {
    let tracker = Tracker::new();
    seed_tree(&tracker).await;

    let err = tracker
        .create_iteration("missing", basic_draft("x"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}
