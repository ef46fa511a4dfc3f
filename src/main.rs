//! Arregmatica demo
//!
//! Opens the document store, seeds a few demo accounts with posts and quiz
//! scores, and prints what the tree looks like afterwards.

use arregmatica::services::{
    AccountService, FeedService, QuizCategory, QuizService, ScoreService, ServiceError,
    Session,
};
use arregmatica::store::{StoreConfig, StoreEngine};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "arregmatica=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Arregmatica v{}", env!("CARGO_PKG_VERSION"));

    let config = StoreConfig::default();
    tracing::info!("Data directory: {:?}", config.data_dir);

    let store = Arc::new(StoreEngine::open(config).await?);
    let flush_handle = store.start_background_flush();

    let accounts = AccountService::new(Arc::clone(&store));
    let feed = FeedService::new(Arc::clone(&store));
    let scores = Arc::new(ScoreService::new(Arc::clone(&store)));
    let quiz = QuizService::new(Arc::clone(&store), Arc::clone(&scores));

    // Seed demo accounts; reruns hit existing records
    let mut sessions = Vec::new();
    for (username, email) in [
        ("ada", "ada@example.com"),
        ("grace", "grace@example.com"),
        ("alan", "alan@example.com"),
    ] {
        match accounts.register(username, email, "demo-password").await {
            Ok(session) => sessions.push(session),
            Err(ServiceError::Conflict(_)) => {
                sessions.push(accounts.sign_in(email, "demo-password").await?);
            }
            Err(e) => return Err(e.into()),
        }
    }
    tracing::info!("Seeded {} demo accounts", sessions.len());

    demo_posts(&feed, &sessions).await?;
    demo_quiz(&quiz, &sessions[0]).await?;

    // Print what the tree looks like
    let timeline = feed.timeline().await?;
    tracing::info!("Timeline has {} posts", timeline.len());
    for post in timeline.iter().take(5) {
        tracing::info!(
            "  @{}: {} ({} likes, {} comments)",
            post.author,
            post.text,
            post.like_count,
            post.comment_count
        );
    }

    let board = scores.leaderboard().await?;
    for entry in &board {
        tracing::info!("  #{} {} - {} points", entry.rank, entry.username, entry.total_score);
    }

    let stats = store.stats().await;
    tracing::info!("Store stats: {}", stats);

    tracing::info!("Shutting down...");
    store.shutdown().await?;
    flush_handle.abort();

    tracing::info!("Arregmatica shutdown complete");
    Ok(())
}

async fn demo_posts(
    feed: &FeedService,
    sessions: &[Session],
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Writing demo posts...");

    let texts = [
        "Just tried the grammar checker on my essay draft.",
        "Word scramble on hard mode is no joke.",
        "Anyone want to start a study group?",
    ];

    for (session, text) in sessions.iter().zip(texts) {
        let post = feed.create_post(&session.uid, text, Vec::new()).await?;
        // Everyone else likes it
        for other in sessions.iter().filter(|s| s.uid != session.uid) {
            feed.toggle_like(&other.uid, &post.uid, &post.post_id).await?;
        }
    }

    tracing::info!("Demo posts written");
    Ok(())
}

async fn demo_quiz(
    quiz: &QuizService,
    session: &Session,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Playing a demo quiz round as @{}...", session.username);

    let (session_id, mut question) = quiz.start(&session.uid, QuizCategory::Easy).await?;
    loop {
        tracing::info!(
            "  Question {}/{}: {}",
            question.index + 1,
            question.total,
            question.scrambled
        );
        // The demo player never unscrambles anything
        let outcome = quiz.answer(&session_id, "no idea").await?;
        if outcome.finished {
            tracing::info!("  Finished with score {}", outcome.score);
            break;
        }
        question = outcome.next.expect("unfinished session has a next question");
    }

    Ok(())
}
