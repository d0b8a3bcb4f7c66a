// tests/statsapi_feed.rs
use atbat_tracker::config::Subject;
use atbat_tracker::feed::providers::statsapi::{parse_live_feed, parse_schedule, ScheduledGame};
use atbat_tracker::feed::types::{HitKind, Play, StrikeoutKind};
use chrono::NaiveDate;

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
}

#[test]
fn schedule_skips_games_not_started() {
    let body = include_str!("fixtures/schedule.json");
    assert_eq!(
        parse_schedule(body).unwrap(),
        vec![ScheduledGame {
            game_pk: 777001,
            official_date: Some(day()),
        }]
    );
}

#[test]
fn schedule_keeps_each_games_own_date() {
    // Queried for June 2nd after midnight: the late game is still June 1st,
    // and a game with no officialDate falls back to its schedule entry.
    let body = r#"{
      "dates": [
        { "date": "2025-06-02", "games": [
          { "gamePk": 1, "officialDate": "2025-06-01", "status": { "abstractGameState": "Live" } },
          { "gamePk": 2, "status": { "abstractGameState": "Final" } }
        ] },
        { "games": [
          { "gamePk": 3, "officialDate": "not a date", "status": { "abstractGameState": "Live" } }
        ] }
      ]
    }"#;
    let june = |d| NaiveDate::from_ymd_opt(2025, 6, d);
    assert_eq!(
        parse_schedule(body).unwrap(),
        vec![
            ScheduledGame { game_pk: 1, official_date: june(1) },
            ScheduledGame { game_pk: 2, official_date: june(2) },
            ScheduledGame { game_pk: 3, official_date: None },
        ]
    );
}

#[test]
fn schedule_without_dates_is_empty() {
    assert!(parse_schedule(r#"{"totalGames":0}"#).unwrap().is_empty());
}

#[test]
fn live_feed_keeps_completed_plays_of_subject_only() {
    let body = include_str!("fixtures/live_feed.json");
    let events = parse_live_feed(body, &Subject::default(), day()).unwrap();

    let keys: Vec<String> = events.iter().map(|e| e.key.to_string()).collect();
    assert_eq!(
        keys,
        vec![
            "2025-06-01_1_2",
            "2025-06-01_3_11",
            "2025-06-01_5_20",
            "2025-06-01_7_29",
            "2025-06-01_9_38",
        ]
    );
}

#[test]
fn live_feed_maps_categories_and_attributes() {
    let body = include_str!("fixtures/live_feed.json");
    let events = parse_live_feed(body, &Subject::default(), day()).unwrap();

    match &events[0].play {
        Play::HomeRun {
            contact,
            contact_class,
            rbi,
            situation,
        } => {
            assert_eq!(contact.exit_velocity, Some(107.4));
            assert_eq!(contact.launch_angle, Some(27.0));
            assert_eq!(contact.distance, Some(412));
            assert_eq!(contact_class.as_deref(), Some("Hard Hit"));
            assert_eq!(*rbi, Some(2));
            assert_eq!(situation.as_deref(), Some("with a runner on"));
        }
        other => panic!("expected home run, got {other:?}"),
    }

    match &events[1].play {
        Play::Strikeout { kind, pitch } => {
            assert_eq!(*kind, Some(StrikeoutKind::Looking));
            assert_eq!(pitch.pitch_type.as_deref(), Some("Sinker"));
            assert_eq!(pitch.speed, Some(94.6));
            assert_eq!(pitch.location.as_deref(), Some("Zone 9"));
        }
        other => panic!("expected strikeout, got {other:?}"),
    }

    assert_eq!(
        events[2].play,
        Play::Walk {
            situation: Some("with runners in scoring position".into())
        }
    );

    match &events[3].play {
        Play::Hit {
            kind,
            contact,
            xba,
            rbi,
        } => {
            assert_eq!(*kind, HitKind::Double);
            assert_eq!(contact.exit_velocity, Some(99.8));
            assert_eq!(contact.distance, None);
            assert_eq!(*xba, None);
            assert_eq!(*rbi, Some(1));
        }
        other => panic!("expected double, got {other:?}"),
    }

    match &events[4].play {
        Play::Other {
            description,
            contact,
        } => {
            assert_eq!(description, "Lineout");
            assert_eq!(contact.distance, Some(250));
        }
        other => panic!("expected other, got {other:?}"),
    }
}

#[test]
fn other_subject_sees_only_own_plays() {
    let body = include_str!("fixtures/live_feed.json");
    let alonso = Subject {
        player_id: 624413,
        name: "Pete Alonso".into(),
        ..Subject::default()
    };
    let events = parse_live_feed(body, &alonso, day()).unwrap();
    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0].play, Play::Other { description, .. } if description == "Groundout"));
}

#[test]
fn malformed_plays_are_tolerated() {
    // No inning, no batter, wrong shapes: nothing usable, but no error either.
    let body = r#"{"liveData":{"plays":{"allPlays":[
        {"about":{"isComplete":true,"atBatIndex":1},"matchup":{"batter":{"id":596019}}},
        {"about":{"isComplete":true,"inning":2,"atBatIndex":4}},
        {}
    ]}}}"#;
    let events = parse_live_feed(body, &Subject::default(), day()).unwrap();
    assert!(events.is_empty());
}

#[test]
fn non_json_body_is_an_error() {
    assert!(parse_live_feed("<html>busy</html>", &Subject::default(), day()).is_err());
}
