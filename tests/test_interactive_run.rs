mod common;

use common::OneRep;

#[tokio::test]
async fn manual_log_during_set_is_recorded() {
    let app = OneRep::new();
    let output = app
        .interactive(
            &["run", "--silent", "--exercise", "Chest Press"],
            &["l 120 f", "q"],
        )
        .await;
    assert!(
        output.status.success(),
        "run failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("▶ Chest Press"), "{stdout}");
    assert!(stdout.contains("logged Chest Press: 120"), "{stdout}");
    assert!(stdout.contains("new PR"), "{stdout}");

    let history = app.json(&["history"]);
    assert_eq!(history[0]["exerciseName"], "Chest Press");
    assert_eq!(history[0]["weight"], 120.0);
    assert_eq!(history[0]["reachedFailure"], true);
}

#[tokio::test]
async fn closing_stdin_ends_the_session() {
    let app = OneRep::new();
    let output = app.interactive(&["run", "--silent"], &[]).await;
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("▶ Leg Press"), "{stdout}");
    assert_eq!(app.json(&["history"]).as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn unknown_exercise_fails_before_starting() {
    let app = OneRep::new();
    let output = app
        .interactive(&["run", "--silent", "--exercise", "Snatch"], &[])
        .await;
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown exercise"));
}

#[tokio::test]
async fn switching_exercise_mid_set() {
    let app = OneRep::new();
    let output = app
        .interactive(&["run", "--silent"], &["n pulldown", "l 75", "q"])
        .await;
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("▶ Pulldown"), "{stdout}");

    let history = app.json(&["history"]);
    assert_eq!(history[0]["exerciseName"], "Pulldown");
    assert_eq!(history[0]["reachedFailure"], false);
}

#[tokio::test]
async fn every_exercise_done_is_reported() {
    let app = OneRep::new();
    for name in [
        "Leg Press",
        "Pulldown",
        "Chest Press",
        "Overhead Press",
        "Seated Row",
        "Leg Curl",
        "Bicep Curl",
        "Tricep Extension",
    ] {
        app.ok(&["exercises", "skip", name]);
    }
    let output = app.interactive(&["run", "--silent"], &[]).await;
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("already complete"));
}
