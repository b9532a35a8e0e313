//! End-to-end scenarios over a real SQLite store and a scripted model.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;

use crate::rag::{
    GenerationOrchestrator, RagSystem, SessionManager, OUTLINE_TOOL_NAME, SEARCH_TOOL_NAME,
};
use crate::ingest::ChunkSettings;
use crate::store::CourseStore;
use crate::tests::support::{text_reply, tool_reply, ScriptedClient};

const MCP_DOC: &str = "Course Title: Introduction to MCP
Course Link: https://example.com/mcp
Course Instructor: Alex Smith

Lesson 0: Getting Started
Lesson Link: https://example.com/mcp/lesson0
MCP is an open protocol that connects language models to tools and data.

Lesson 1: Core Concepts
Lesson Link: https://example.com/mcp/lesson1
Servers expose tools, resources and prompts to clients.
";

const RETRIEVAL_DOC: &str = "Course Title: Advanced Retrieval for AI
Course Link: https://example.com/retrieval
Course Instructor: Jordan Lee

Lesson 1: Query Expansion
Expanding queries with generated answers improves recall.
";

fn write(dir: &Path, name: &str, contents: &[u8]) {
    fs::write(dir.join(name), contents).unwrap();
}

fn docs_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "mcp.txt", MCP_DOC.as_bytes());
    write(dir.path(), "retrieval.md", RETRIEVAL_DOC.as_bytes());
    write(dir.path(), "cover.png", &[0x89, 0x50, 0x4e, 0x47]);
    dir
}

fn system(client: &Arc<ScriptedClient>) -> RagSystem {
    let store = CourseStore::open_in_memory(384, 5).unwrap();
    RagSystem::new(
        Arc::new(store),
        GenerationOrchestrator::new(client.clone(), "test-model"),
        SessionManager::new(2),
        ChunkSettings::default(),
    )
}

#[tokio::test]
async fn test_folder_ingestion_skips_existing_courses() {
    let client = Arc::new(ScriptedClient::new(vec![]));
    let rag = system(&client);
    let docs = docs_dir();

    let stats = rag.add_course_folder(docs.path(), false).await.unwrap();
    assert_eq!(stats.courses, 2);
    assert_eq!(stats.skipped, 0);
    assert!(stats.chunks >= 3);

    let again = rag.add_course_folder(docs.path(), false).await.unwrap();
    assert_eq!(again.courses, 0);
    assert_eq!(again.chunks, 0);
    assert_eq!(again.skipped, 2);

    let analytics = rag.course_analytics().unwrap();
    assert_eq!(analytics.total_courses, 2);
    assert!(analytics
        .course_titles
        .contains(&"Introduction to MCP".to_string()));
    assert!(analytics
        .course_titles
        .contains(&"Advanced Retrieval for AI".to_string()));
}

#[tokio::test]
async fn test_folder_ingestion_with_reset() {
    let client = Arc::new(ScriptedClient::new(vec![]));
    let rag = system(&client);
    let docs = docs_dir();

    let first = rag.add_course_folder(docs.path(), false).await.unwrap();
    let reset = rag.add_course_folder(docs.path(), true).await.unwrap();

    assert_eq!(reset.courses, 2);
    assert_eq!(reset.chunks, first.chunks);
    assert_eq!(rag.store().chunk_count().unwrap(), first.chunks);
}

#[tokio::test]
async fn test_unreadable_document_is_skipped() {
    let client = Arc::new(ScriptedClient::new(vec![]));
    let rag = system(&client);
    let docs = docs_dir();
    write(docs.path(), "broken.txt", &[0xff, 0xfe, 0x00, 0xc3]);

    let stats = rag.add_course_folder(docs.path(), false).await.unwrap();
    assert_eq!(stats.courses, 2);
}

#[tokio::test]
async fn test_missing_folder_indexes_nothing() {
    let client = Arc::new(ScriptedClient::new(vec![]));
    let rag = system(&client);
    let dir = TempDir::new().unwrap();

    let stats = rag
        .add_course_folder(&dir.path().join("absent"), false)
        .await
        .unwrap();
    assert_eq!(stats.courses, 0);
    assert_eq!(rag.course_analytics().unwrap().total_courses, 0);
}

#[tokio::test]
async fn test_single_document_ingestion() {
    let client = Arc::new(ScriptedClient::new(vec![]));
    let rag = system(&client);
    let docs = docs_dir();

    let (course, chunks) = rag
        .add_course_document(&docs.path().join("mcp.txt"))
        .await
        .unwrap();
    assert_eq!(course.title, "Introduction to MCP");
    assert_eq!(course.lessons.len(), 2);
    assert_eq!(chunks, 2);
    assert!(rag.store().contains_course("Introduction to MCP").unwrap());
}

#[tokio::test]
async fn test_query_returns_answer_and_citations() {
    let client = Arc::new(ScriptedClient::new(vec![
        tool_reply(
            None,
            &[(
                "s",
                SEARCH_TOOL_NAME,
                json!({"query": "what is MCP", "course_name": "MCP"}),
            )],
        ),
        text_reply("MCP connects language models to tools."),
    ]));
    let rag = system(&client);
    let docs = docs_dir();
    rag.add_course_folder(docs.path(), false).await.unwrap();

    let outcome = rag.query("What is MCP?", None).await.unwrap();

    assert_eq!(outcome.answer, "MCP connects language models to tools.");
    assert_eq!(outcome.rounds_used, 1);
    assert_eq!(outcome.tools_used, vec![SEARCH_TOOL_NAME]);
    assert!(!outcome.sources.is_empty());
    for source in &outcome.sources {
        assert!(source.text.starts_with("Introduction to MCP, Lesson "));
        assert!(source
            .link
            .as_deref()
            .unwrap()
            .starts_with("https://example.com/mcp/lesson"));
    }

    let first = &client.requests()[0];
    assert_eq!(
        first.messages[0].blocks(),
        vec![lectern_llm::ContentBlock::text(
            "Answer this question about course materials: What is MCP?"
        )]
    );
    let tool_names: Vec<&str> = first.tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(tool_names, vec![SEARCH_TOOL_NAME, OUTLINE_TOOL_NAME]);
}

#[tokio::test]
async fn test_unknown_course_reaches_model_as_plain_result() {
    let client = Arc::new(ScriptedClient::new(vec![
        tool_reply(
            None,
            &[(
                "s",
                SEARCH_TOOL_NAME,
                json!({"query": "welds", "course_name": "Underwater Basket Weaving"}),
            )],
        ),
        text_reply("I could not find that course."),
    ]));
    let rag = system(&client);
    let docs = docs_dir();
    rag.add_course_folder(docs.path(), false).await.unwrap();

    let outcome = rag.query("Tell me about welds", None).await.unwrap();

    assert_eq!(outcome.rounds_used, 1);
    assert!(outcome.sources.is_empty());
    let results = crate::tests::support::tool_results(&client.requests()[1], 2);
    assert!(results[0].1.starts_with("No course found matching"));
    assert!(!results[0].2);
}

#[tokio::test]
async fn test_session_history_feeds_next_query() {
    let client = Arc::new(ScriptedClient::new(vec![
        text_reply("MCP is a protocol."),
        text_reply("It has two lessons."),
    ]));
    let rag = system(&client);
    let session = rag.sessions().create_session().unwrap();

    rag.query("What is MCP?", Some(&session)).await.unwrap();
    let second = rag.query("How long is it?", Some(&session)).await.unwrap();

    assert!(second.sources.is_empty());
    let system_prompt = client.requests()[1].system.clone().unwrap();
    assert!(system_prompt
        .ends_with("Previous conversation:\nUser: What is MCP?\nAssistant: MCP is a protocol."));

    let history = rag.sessions().history(&session).unwrap().unwrap();
    assert!(history.contains("User: How long is it?"));
}

#[tokio::test]
async fn test_sources_reset_between_queries() {
    let client = Arc::new(ScriptedClient::new(vec![
        tool_reply(None, &[("s", SEARCH_TOOL_NAME, json!({"query": "tools and data"}))]),
        text_reply("first"),
        text_reply("second"),
    ]));
    let rag = system(&client);
    let docs = docs_dir();
    rag.add_course_folder(docs.path(), false).await.unwrap();

    let first = rag.query("q1", None).await.unwrap();
    let second = rag.query("q2", None).await.unwrap();

    assert!(!first.sources.is_empty());
    assert!(second.sources.is_empty());
    assert_eq!(second.rounds_used, 0);
}
