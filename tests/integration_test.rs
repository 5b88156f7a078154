use scenecut::{
    config::AppConfig,
    db::{self, queries, scene_queries, snapshot_queries},
    models::job::JobStatus,
    models::snapshot::ImageFormat,
    pipeline::{keyframes, recorder, segmenter},
};
use std::path::PathBuf;

/// Integration test: job lifecycle and the persistence side of the pipeline.
///
/// Covers:
/// 1. Job + config creation and retrieval
/// 2. Video attach and the extraction status gate (single-flight)
/// 3. Atomic snapshot batch insert and the (job, timestamp) uniqueness
///    constraint
/// 4. Scene rebuild: interval layout, counts, idempotence
/// 5. Keyframe selection over a persisted scene
/// 6. Cascade delete from the job root
///
/// Note: requires a running PostgreSQL instance configured via DATABASE_URL.
#[tokio::test]
#[ignore] // Run with: cargo test --test integration_test -- --ignored
async fn test_pipeline_persistence_flow() {
    let config = AppConfig::from_env().expect("Failed to load config");

    let db_pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run migrations");

    // 1. Create job + config
    let params = queries::NewJobParams {
        sampling_fps: 1.0,
        chunk_length_sec: 10,
        resize_width: Some(512),
        grayscale: false,
        black_white: false,
        image_format: ImageFormat::Jpg,
    };
    let (job, cfg) = queries::create_job(&db_pool, &params)
        .await
        .expect("Failed to create job");

    assert_eq!(job.status, JobStatus::Created);
    assert_eq!(cfg.job_id, job.id);
    assert_eq!(cfg.chunk_length_sec, 10);

    let fetched = queries::get_job(&db_pool, job.id)
        .await
        .expect("Failed to fetch job")
        .expect("Job missing");
    assert_eq!(fetched.status, JobStatus::Created);

    // 2. Extraction gate: no video yet, job still `created`
    assert!(!queries::try_begin_extraction(&db_pool, job.id)
        .await
        .expect("gate query failed"));

    let asset = queries::attach_video(&db_pool, job.id, "/tmp/scenecut-test/source.mp4")
        .await
        .expect("Failed to attach video")
        .expect("Attach refused");
    assert_eq!(asset.job_id, job.id);

    // Second upload is refused: the asset is immutable once created.
    assert!(queries::attach_video(&db_pool, job.id, "/tmp/other.mp4")
        .await
        .expect("attach query failed")
        .is_none());

    // Single-flight: first trigger wins, second is refused.
    assert!(queries::try_begin_extraction(&db_pool, job.id).await.unwrap());
    assert!(!queries::try_begin_extraction(&db_pool, job.id).await.unwrap());

    // 3. Snapshot batch: 24 frames at 1 fps -> t = 0..=23
    let frames: Vec<(PathBuf, Option<(u32, u32)>)> = (0..24)
        .map(|i| {
            let dims = if i == 5 { None } else { Some((512u32, 288u32)) };
            (PathBuf::from(format!("/tmp/scenecut-test/{i:06}.jpg")), dims)
        })
        .collect();
    let inserted = recorder::record_snapshots(&db_pool, job.id, &frames, cfg.sampling_fps)
        .await
        .expect("Failed to record snapshots");
    assert_eq!(inserted, 24);

    let snapshots = snapshot_queries::list_for_job(&db_pool, job.id)
        .await
        .expect("Failed to list snapshots");
    assert_eq!(snapshots.len(), 24);
    assert_eq!(snapshots[0].timestamp_sec, 0.0);
    assert_eq!(snapshots[23].timestamp_sec, 23.0);
    // Unreadable frame recorded with null dimensions, ordering preserved.
    assert_eq!(snapshots[5].width, None);

    // Duplicate timestamps violate the unique constraint and roll the
    // whole batch back.
    let dup = vec![(PathBuf::from("/tmp/dup.jpg"), Some((512u32, 288u32)))];
    assert!(recorder::record_snapshots(&db_pool, job.id, &dup, cfg.sampling_fps)
        .await
        .is_err());
    let count_after = snapshot_queries::list_for_job(&db_pool, job.id)
        .await
        .unwrap()
        .len();
    assert_eq!(count_after, 24);

    queries::mark_extracted(&db_pool, job.id).await.unwrap();

    // 4. Scene rebuild: floor(23 / 10) + 1 = 3 buckets, none empty
    let created = segmenter::build_scenes(&db_pool, job.id)
        .await
        .expect("Failed to build scenes");
    assert_eq!(created, 3);

    let scenes = scene_queries::list_with_counts(&db_pool, job.id)
        .await
        .expect("Failed to list scenes");
    assert_eq!(scenes.len(), 3);
    let intervals: Vec<(f64, f64)> = scenes
        .iter()
        .map(|(s, _)| (s.start_sec, s.end_sec))
        .collect();
    assert_eq!(intervals, vec![(0.0, 10.0), (10.0, 20.0), (20.0, 30.0)]);
    let counts: Vec<i64> = scenes.iter().map(|(_, c)| *c).collect();
    assert_eq!(counts, vec![10, 10, 4]);

    // Rebuild is idempotent: same intervals, same counts, fresh rows.
    segmenter::build_scenes(&db_pool, job.id).await.unwrap();
    let rebuilt = scene_queries::list_with_counts(&db_pool, job.id)
        .await
        .unwrap();
    let rebuilt_intervals: Vec<(f64, f64)> = rebuilt
        .iter()
        .map(|(s, _)| (s.start_sec, s.end_sec))
        .collect();
    assert_eq!(rebuilt_intervals, intervals);

    // 5. Keyframes over the first scene: 10 snapshots, k = 4
    let (first_scene, _) = &rebuilt[0];
    let scene_snaps = snapshot_queries::list_for_scene(&db_pool, first_scene.id)
        .await
        .expect("Failed to list scene snapshots");
    assert_eq!(scene_snaps.len(), 10);
    let selected = keyframes::pick_uniform(&scene_snaps, 4);
    let timestamps: Vec<f64> = selected.iter().map(|s| s.timestamp_sec).collect();
    assert_eq!(timestamps, vec![0.0, 3.0, 6.0, 9.0]);

    // 6. Cascade delete
    assert!(queries::delete_job(&db_pool, job.id).await.unwrap());
    assert!(queries::get_job(&db_pool, job.id).await.unwrap().is_none());
    assert!(snapshot_queries::list_for_job(&db_pool, job.id)
        .await
        .unwrap()
        .is_empty());
    assert!(scene_queries::list_with_counts(&db_pool, job.id)
        .await
        .unwrap()
        .is_empty());
}
