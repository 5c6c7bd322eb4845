use std::path::Path;

use chrono::NaiveDate;
use findpaw_core::{FeatureTag, Sighting, UserStats};

use super::*;
use crate::report::{content_type_for, SubmitArgs};

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["findpaw"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn sightings_days_is_optional() {
    let cli = Cli::try_parse_from(["findpaw", "sightings"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Sightings { days: None })));

    let cli = Cli::try_parse_from(["findpaw", "sightings", "--days", "3"])
        .expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Sightings { days: Some(3) })));
}

#[test]
fn report_submit_collects_repeated_features() {
    let cli = Cli::try_parse_from([
        "findpaw", "report", "submit", "--photo", "dog.png", "--lat", "37.5", "--lng", "127.0",
        "--feature", "collar", "--feature", "scared", "--breed", "Jindo",
    ])
    .expect("expected valid cli args");

    let Some(Commands::Report {
        command: ReportCommands::Submit(SubmitArgs {
            features, breed, sighted_at, ..
        }),
    }) = cli.command
    else {
        panic!("expected report submit");
    };
    assert_eq!(features, vec![FeatureTag::Collar, FeatureTag::Scared]);
    assert_eq!(breed.as_deref(), Some("Jindo"));
    assert!(sighted_at.is_none());
}

#[test]
fn report_submit_accepts_negative_coordinates() {
    let cli = Cli::try_parse_from([
        "findpaw", "report", "submit", "--photo", "dog.jpg", "--lat", "-33.86", "--lng", "-151.2",
    ])
    .expect("expected valid cli args");

    let Some(Commands::Report {
        command: ReportCommands::Submit(args),
    }) = cli.command
    else {
        panic!("expected report submit");
    };
    assert!((args.lat + 33.86).abs() < f64::EPSILON);
    assert!((args.lng + 151.2).abs() < f64::EPSILON);
}

#[test]
fn report_submit_rejects_unknown_feature() {
    let result = Cli::try_parse_from([
        "findpaw", "report", "submit", "--photo", "dog.jpg", "--lat", "1", "--lng", "2",
        "--feature", "sparkly",
    ]);
    assert!(result.is_err());
}

#[test]
fn report_submit_requires_photo_and_location() {
    assert!(Cli::try_parse_from(["findpaw", "report", "submit", "--lat", "1", "--lng", "2"]).is_err());
    assert!(Cli::try_parse_from(["findpaw", "report", "submit", "--photo", "a.jpg"]).is_err());
}

#[test]
fn auth_callback_requires_verifier() {
    assert!(Cli::try_parse_from(["findpaw", "auth", "callback", "--code", "abc"]).is_err());

    let cli = Cli::try_parse_from([
        "findpaw", "auth", "callback", "--error", "access_denied", "--verifier", "v",
    ])
    .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Auth {
            command: AuthCommands::Callback { code: None, error: Some(_), .. }
        })
    ));
}

#[test]
fn auth_login_url_parses() {
    let cli = Cli::try_parse_from(["findpaw", "auth", "login-url"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Auth {
            command: AuthCommands::LoginUrl { redirect_to: None }
        })
    ));
}

#[test]
fn content_type_follows_extension() {
    assert_eq!(content_type_for(Path::new("a.PNG")), "image/png");
    assert_eq!(content_type_for(Path::new("b.webp")), "image/webp");
    assert_eq!(content_type_for(Path::new("c.jpeg")), "image/jpeg");
    assert_eq!(content_type_for(Path::new("camera")), "image/jpeg");
}

#[test]
fn sighting_line_falls_back_to_generic_label() {
    let sighting: Sighting = sighting_fixture();
    let today = NaiveDate::from_ymd_opt(2020, 1, 1).expect("valid date");

    let line = sightings::format_sighting_line(&sighting, today);

    assert!(line.contains("Sighting report"), "{line}");
    assert!(line.contains("[brown]"), "{line}");
    assert!(line.contains("Wearing a collar"), "{line}");
}

#[test]
fn stats_line_lists_every_status() {
    let stats = UserStats {
        lost_posts_count: 4,
        searching_count: 2,
        found_count: 1,
        closed_count: 1,
    };
    assert_eq!(
        auth::format_stats(&stats),
        "lost posts: 4 (searching 2, found 1, closed 1)"
    );
}

fn sighting_fixture() -> Sighting {
    Sighting {
        id: uuid::Uuid::nil(),
        image_url: "https://cdn.test/images/sightings/a.jpg".into(),
        latitude: 37.5,
        longitude: 127.0,
        breed: Some("  ".into()),
        color: Some("brown".into()),
        features: Some(vec!["collar".into(), "sparkly".into()]),
        description: None,
        sighted_at: chrono::Utc::now(),
    }
}
