use chrono::{Duration, TimeZone, Utc};
use onokoshi_core::{
    JsonFileStore, RecordStore, RouteSetDraft, SequentialIds, Timestamp, Tracker, TrackerConfig,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};

static TICKS: AtomicI64 = AtomicI64::new(0);

/// Every call is one hour after the previous one.
fn ticking_clock() -> Timestamp {
    let tick = TICKS.fetch_add(1, Ordering::SeqCst);
    Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap() + Duration::hours(tick)
}

fn temp_path(label: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "onokoshi-history-{label}-{}.json",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

fn tracker(path: &PathBuf) -> Tracker<JsonFileStore, SequentialIds> {
    Tracker::with_ids(
        JsonFileStore::open(path).expect("open store"),
        TrackerConfig::default(),
        SequentialIds::new("id"),
    )
    .with_clock(ticking_clock)
}

/// Record one run where `remnants` lists `(route name, count, comment)`.
fn record(
    tracker: &mut Tracker<JsonFileStore, SequentialIds>,
    set_id: &str,
    remnants: &[(&str, u32, &str)],
) {
    let run = tracker.start_run(set_id).expect("start run");
    tracker
        .update_run(&run.id, |run| {
            for (name, count, comment) in remnants {
                let rr = run.find_route_run_mut(name).expect("route exists");
                rr.set_remaining(true);
                rr.set_remaining_count(*count);
                rr.comment = (*comment).to_string();
            }
            Ok(())
        })
        .expect("save run");
}

#[test]
fn five_run_history_produces_all_views() {
    let path = temp_path("views");
    let mut tracker = tracker(&path);
    let set = tracker
        .register_route_set(&RouteSetDraft {
            name: "400 NoLeyLine".to_string(),
            text: "-Katsu 5\n-Seirei 8\n{Mond}Kaze 3\nTsurumi 12".to_string(),
            expected_elite_count: 400,
        })
        .expect("register");

    record(&mut tracker, &set.id, &[("Katsu", 1, "#ミリ残し")]);
    record(&mut tracker, &set.id, &[("Katsu", 2, "#ミリ残し #狩り漏れ")]);
    record(&mut tracker, &set.id, &[]);
    record(&mut tracker, &set.id, &[("Seirei", 5, "#あきらめた")]);
    record(&mut tracker, &set.id, &[("Katsu", 1, ""), ("Kaze", 1, "#ミリ残し")]);

    let report = tracker.statistics().expect("stats");
    assert_eq!(report.routes.len(), 4);

    let recent: Vec<&str> = report.recent.iter().map(|s| s.route_name.as_str()).collect();
    assert_eq!(recent, vec!["Katsu", "Kaze", "Seirei"]);

    let frequent: Vec<(&str, u32, u32)> = report
        .frequent
        .iter()
        .map(|s| (s.route_name.as_str(), s.remaining_runs, s.total_runs))
        .collect();
    assert_eq!(
        frequent,
        vec![("Katsu", 3, 5), ("Seirei", 1, 5), ("Kaze", 1, 5)]
    );

    let voluminous: Vec<(&str, u64)> = report
        .voluminous
        .iter()
        .map(|s| (s.route_name.as_str(), s.total_remaining_count))
        .collect();
    assert_eq!(voluminous, vec![("Seirei", 5), ("Katsu", 4), ("Kaze", 1)]);

    let rare: Vec<&str> = report.rare.iter().map(|s| s.route_name.as_str()).collect();
    assert_eq!(rare, vec!["Seirei", "Kaze", "Katsu"]);

    let tags: Vec<(&str, u32)> = report
        .tags
        .iter()
        .map(|t| (t.tag.as_str(), t.count))
        .collect();
    assert_eq!(tags, vec![("#ミリ残し", 3), ("#狩り漏れ", 1), ("#あきらめた", 1)]);

    let reopened = JsonFileStore::open(&path).expect("reopen");
    assert_eq!(reopened.runs().expect("runs").len(), 5);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn run_summaries_list_newest_first() {
    let path = temp_path("summaries");
    let mut tracker = tracker(&path);
    let set = tracker
        .register_route_set(&RouteSetDraft {
            name: "short".to_string(),
            text: "a 1\nb 2".to_string(),
            expected_elite_count: 10,
        })
        .expect("register");
    record(&mut tracker, &set.id, &[("a", 3, "")]);
    record(&mut tracker, &set.id, &[]);

    let summaries = tracker.run_summaries().expect("summaries");
    assert_eq!(summaries.len(), 2);
    assert!(summaries[0].updated_at > summaries[1].updated_at);
    assert_eq!(summaries[0].remaining_count, 0);
    assert_eq!(summaries[0].final_count, 10);
    assert_eq!(summaries[1].remaining_count, 3);
    assert_eq!(summaries[1].final_count, 7);
    let _ = std::fs::remove_file(&path);
}
