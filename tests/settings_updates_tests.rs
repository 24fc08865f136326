use std::time::Duration;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use edutools::{
    auth::TokenInfo,
    checkio::{CheckiOAccount, CheckiOPlatform, CheckiOUserInfo},
    config,
    constants::{code_file_name, line_comment_prefix},
    course::{CheckStatus, Course, Lesson, StudyItem, Task},
    settings::Settings,
    stepik::{
        StepikAccount,
        utils::{set_course_language, set_status_recursively, stepik_link},
        wrappers::{RemoteCourse, StepikUser},
    },
    updates::{new_courses, next_check_delay},
};
use uuid::Uuid;

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().expect("valid timestamp")
}

fn remote(id: u64, updated: DateTime<Utc>) -> RemoteCourse {
    RemoteCourse {
        id,
        title: format!("Course {id}"),
        update_date: updated,
        ..RemoteCourse::default()
    }
}

#[test]
fn settings_survive_a_save() {
    let path = std::env::temp_dir()
        .join(format!("edutools-settings-{}", Uuid::new_v4()))
        .join("settings.json");
    let tokens = TokenInfo {
        access_token:  "a".into(),
        refresh_token: "r".into(),
        expires_in:    1_700_000_000,
    };

    let mut settings = Settings::default();
    settings.stepik_account = Some(StepikAccount::new(
        StepikUser {
            id: 3,
            first_name: "Ada".into(),
            ..StepikUser::default()
        },
        tokens.clone(),
    ));
    settings.checkio_accounts.insert(
        CheckiOPlatform::Js,
        CheckiOAccount::new(
            CheckiOUserInfo {
                username: "alice".into(),
                uid:      9,
            },
            tokens,
        ),
    );
    settings.last_time_checked = at(1_600_000_000);
    settings.shown_course_ids.extend([1, 2]);

    settings.save(&path).expect("save settings");
    let loaded = Settings::load(&path).expect("load settings");

    assert_eq!(loaded, settings);
    if let Some(dir) = path.parent() {
        std::fs::remove_dir_all(dir).ok();
    }
}

#[test]
fn missing_settings_are_defaults() {
    let path = std::env::temp_dir().join(format!("edutools-missing-{}.json", Uuid::new_v4()));
    assert_eq!(Settings::load(&path).expect("defaults"), Settings::default());
}

#[test]
fn new_courses_are_announced_once() {
    let mut settings = Settings {
        last_time_checked: at(1_000),
        ..Settings::default()
    };
    let courses = vec![
        remote(1, at(2_000)),
        remote(2, at(500)),
        remote(3, at(1_000)),
        remote(4, at(3_000)),
    ];
    settings.shown_course_ids.insert(4);

    let fresh: Vec<u64> = new_courses(&courses, &mut settings, at(5_000))
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(fresh, vec![1]);
    assert_eq!(settings.last_time_checked, at(5_000));
    assert!(settings.shown_course_ids.contains(&1));

    let again = new_courses(&courses, &mut settings, at(6_000));
    assert!(again.is_empty());
}

#[test]
fn updates_within_a_second_of_the_check_are_old() {
    let mut settings = Settings {
        last_time_checked: at(1_000),
        ..Settings::default()
    };
    let courses = vec![remote(1, at(1_000) + TimeDelta::milliseconds(900))];

    assert!(new_courses(&courses, &mut settings, at(2_000)).is_empty());
}

#[test]
fn next_check_waits_for_the_interval() {
    let day = Duration::from_secs(86_400);

    assert_eq!(next_check_delay(at(0), day, at(86_000)), Duration::from_secs(400));
    assert_eq!(next_check_delay(at(0), day, at(90_000)), Duration::ZERO);
    assert!(next_check_delay(at(0), Duration::MAX, at(0)) > day);
}

#[test]
fn course_language_comes_from_the_course_type() {
    let mut course = Course::builder().name("Remote").build();

    set_course_language(&mut course, "pycharm11 Python");
    assert_eq!(course.programming_language, "Python");

    set_course_language(&mut course, "PyCharm");
    assert_eq!(course.programming_language, "Python");
}

#[test]
fn statuses_reach_every_lesson() {
    let mut lesson = Lesson::new("lesson1");
    lesson.id = 12;
    lesson.tasks = vec![Task::builder().name("a").build(), Task::builder().name("b").build()];
    let mut course = Course::builder()
        .name("Remote")
        .items(vec![StudyItem::Lesson(lesson)])
        .build();
    course.init();

    set_status_recursively(&mut course, CheckStatus::Failed);
    assert!(course.tasks().iter().all(|(_, t)| t.status == CheckStatus::Failed));

    let lesson = course.items[0].as_lesson().expect("lesson");
    assert_eq!(
        stepik_link("https://stepik.org", lesson, &lesson.tasks[1]),
        "https://stepik.org/lesson/12/step/2"
    );
}

#[test]
fn language_helpers_cover_common_languages() {
    assert_eq!(line_comment_prefix("Python"), "#");
    assert_eq!(line_comment_prefix("JAVA"), "//");
    assert_eq!(line_comment_prefix("haskell"), "--");
    assert_eq!(code_file_name("python3"), "main.py");
    assert_eq!(code_file_name("kotlin"), "Main.kt");
}

#[test]
fn config_defaults_point_at_the_public_sites() {
    let config = config::get().expect("config");

    if std::env::var_os("EDU_STEPIK_URL").is_none() {
        assert_eq!(config.stepik_url(), "https://stepik.org");
    }
    assert!(config.solutions_concurrency() >= 1);
    assert!(!config.hyperskill_client_id().is_empty());
    assert!(config::user_agent().starts_with("EduTools/version("));
}
