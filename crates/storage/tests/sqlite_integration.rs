use std::collections::BTreeMap;

use chrono::Duration;
use lesson_core::model::{
    AnswerValue, AssessmentQuestion, BadgeTier, CompletionRecord, ContentType, ModuleId,
    QuestionKind, RawAnswer, SectionId, StudentId,
};
use lesson_core::scoring::score;
use lesson_core::time::fixed_now;
use storage::repository::{
    BadgeAward, BadgeRepository, CompletionRepository, StorageError, SubmissionRecord,
    SubmissionRepository, SubmissionStatus,
};
use storage::sqlite::SqliteRepository;

async fn repo(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn completion(score: f64, tier: BadgeTier, minutes_after: i64) -> CompletionRecord {
    CompletionRecord {
        student_id: StudentId::new("student-1"),
        module_id: ModuleId::new("fractions"),
        final_score: score,
        time_spent_minutes: 18,
        pre_test_score: Some(40.0),
        post_test_score: None,
        sections_completed: 4,
        total_sections: 4,
        perfect_sections: 1,
        badge_tier: tier,
        completed_at: fixed_now() + Duration::minutes(minutes_after),
    }
}

#[tokio::test]
async fn submissions_keep_answers_and_results() {
    let repo = repo("memdb_submissions").await;

    let questions = vec![
        AssessmentQuestion::new("q1", QuestionKind::TrueFalse, "Is 1/2 > 1/3?")
            .with_correct(AnswerValue::Flag(true)),
        AssessmentQuestion::new("q2", QuestionKind::ShortAnswer, "Half of 8?")
            .with_correct(AnswerValue::Text("4".into())),
    ];
    let answers = BTreeMap::from([(0, RawAnswer::flag(true)), (1, RawAnswer::text(" 4 "))]);
    let result = score(&questions, &answers);

    let submitted = SubmissionRecord {
        student_id: StudentId::new("student-1"),
        module_id: ModuleId::new("fractions"),
        section_id: SectionId::new("check"),
        section_title: "Check".into(),
        section_type: ContentType::Assessment,
        answers: answers.clone(),
        submitted_at: fixed_now(),
        result: Some(result.clone()),
        time_spent_seconds: 95,
        status: SubmissionStatus::Submitted,
    };
    let draft = SubmissionRecord {
        section_id: SectionId::new("reflect"),
        section_title: "Reflect".into(),
        section_type: ContentType::QuickWrite,
        answers: BTreeMap::new(),
        result: None,
        status: SubmissionStatus::Draft,
        ..submitted.clone()
    };

    let first = repo.save_submission(&submitted).await.unwrap();
    let second = repo.save_submission(&draft).await.unwrap();
    assert!(second > first);

    let stored = repo
        .list_submissions(&StudentId::new("student-1"), &ModuleId::new("fractions"))
        .await
        .unwrap();
    assert_eq!(stored, vec![submitted, draft]);
    assert_eq!(stored[0].result.as_ref().map(|r| r.percentage), Some(100.0));
}

#[tokio::test]
async fn latest_completion_is_newest_by_time() {
    let repo = repo("memdb_completions").await;

    repo.save_completion(&completion(70.0, BadgeTier::Bronze, 0))
        .await
        .unwrap();
    repo.save_completion(&completion(95.0, BadgeTier::Gold, 30))
        .await
        .unwrap();

    let latest = repo
        .latest_completion(&StudentId::new("student-1"), &ModuleId::new("fractions"))
        .await
        .unwrap()
        .expect("completion");
    assert_eq!(latest, completion(95.0, BadgeTier::Gold, 30));

    let missing = repo
        .latest_completion(&StudentId::new("student-2"), &ModuleId::new("fractions"))
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn badge_awards_are_unique_per_tier() {
    let repo = repo("memdb_badges").await;

    let gold = BadgeAward::for_completion(&completion(95.0, BadgeTier::Gold, 0), fixed_now());
    let bronze = BadgeAward::for_completion(
        &completion(50.0, BadgeTier::Bronze, 5),
        fixed_now() + Duration::minutes(5),
    );

    repo.award_badge(&gold).await.unwrap();
    repo.award_badge(&gold).await.unwrap();
    repo.award_badge(&bronze).await.unwrap();

    let badges = repo.list_badges(&StudentId::new("student-1")).await.unwrap();
    assert_eq!(badges, vec![gold, bronze]);
    assert_eq!(badges[0].icon, "medal-gold");
    assert_eq!(badges[1].rarity, "common");
}

#[tokio::test]
async fn corrupt_rows_surface_as_serialization_errors() {
    let repo = repo("memdb_corrupt").await;

    sqlx::query(
        r"
        INSERT INTO completions (
            student_id, module_id, final_score, time_spent_minutes,
            pre_test_score, post_test_score, sections_completed,
            total_sections, perfect_sections, badge_tier, completed_at
        )
        VALUES ('student-1', 'fractions', 50.0, 3, NULL, NULL, 1, 1, 0, 'diamond', ?1)
        ",
    )
    .bind(fixed_now())
    .execute(repo.pool())
    .await
    .unwrap();

    let err = repo
        .latest_completion(&StudentId::new("student-1"), &ModuleId::new("fractions"))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Serialization(_)));
}
