// Assistant responder tests
// The canned AI analysis chat: greeting, quoted answers, interview questions,
// and the typing indicator around each reply.

mod common;
use common::{new_test_session, wait_for_event, ScriptedTransport};

use anyhow::Result;
use tokio::time::Duration;

use devths_chat::chat::assistant::{
    AssistantResponder, ANALYSIS_GREETING, ASSISTANT_ID, INTERVIEW_QUESTIONS,
};
use devths_chat::{ChatEvent, TypingStatus};

fn is_assistant_message(event: &ChatEvent) -> bool {
    matches!(event, ChatEvent::MessageAppended(m) if m.sender_id == ASSISTANT_ID)
}

#[tokio::test]
async fn greeting_posts_the_analysis_report() -> Result<()> {
    let (session, mut events) = new_test_session(ScriptedTransport::new());
    let assistant = AssistantResponder::new(session.clone(), Duration::from_millis(10));

    assistant.greet();

    let event = wait_for_event(&mut events, is_assistant_message, 2).await?;
    match event {
        ChatEvent::MessageAppended(message) => {
            assert_eq!(message.content, ANALYSIS_GREETING);
            assert_eq!(message.sender_name, "AI 분석");
        }
        _ => unreachable!(),
    }
    Ok(())
}

#[tokio::test]
async fn answers_quote_the_user_message() -> Result<()> {
    let (session, mut events) = new_test_session(ScriptedTransport::new());
    let assistant = AssistantResponder::new(session.clone(), Duration::from_millis(10));

    assistant.answer("포트폴리오 피드백 부탁드려요");

    let event = wait_for_event(&mut events, is_assistant_message, 2).await?;
    match event {
        ChatEvent::MessageAppended(message) => {
            assert!(message
                .content
                .starts_with("\"포트폴리오 피드백 부탁드려요\"에 대한 답변입니다."));
        }
        _ => unreachable!(),
    }
    Ok(())
}

#[tokio::test]
async fn typing_indicator_wraps_each_reply() -> Result<()> {
    let (session, mut events) = new_test_session(ScriptedTransport::new());
    let assistant = AssistantResponder::new(session.clone(), Duration::from_millis(10));

    assistant.interview_questions();

    wait_for_event(
        &mut events,
        |e| {
            matches!(
                e,
                ChatEvent::Typing { user_id, status: TypingStatus::Composing }
                    if user_id == ASSISTANT_ID
            )
        },
        2,
    )
    .await?;
    wait_for_event(
        &mut events,
        |e| {
            matches!(
                e,
                ChatEvent::Typing { user_id, status: TypingStatus::Inactive }
                    if user_id == ASSISTANT_ID
            )
        },
        2,
    )
    .await?;

    let event = wait_for_event(&mut events, is_assistant_message, 2).await?;
    match event {
        ChatEvent::MessageAppended(message) => {
            assert_eq!(message.content, INTERVIEW_QUESTIONS);
        }
        _ => unreachable!(),
    }
    Ok(())
}

#[tokio::test]
async fn shutdown_swallows_scheduled_replies() -> Result<()> {
    let (session, mut events) = new_test_session(ScriptedTransport::new());
    let assistant = AssistantResponder::new(session.clone(), Duration::from_millis(200));

    assistant.answer("대답하지 마세요");
    session.shutdown();

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(session.messages().await.is_empty());
    assert!(wait_for_event(&mut events, is_assistant_message, 1).await.is_err());
    Ok(())
}
