use anyhow::Result;
use clap::Parser;
use futures_util::StreamExt;
use log::{info, warn, LevelFilter};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Duration;
use tokio_stream::wrappers::ReceiverStream;

mod utils;

use chrono::Local;
use devths_chat::chat::assistant::{AssistantResponder, ASSISTANT_ID};
use devths_chat::chat::{ChatSession, SimulatedTransport};
use devths_chat::format;
use devths_chat::models::{DeliveryStatus, Message};
use devths_chat::profile::{load_profile, save_profile, Profile};
use devths_chat::ChatEvent;

const BUBBLE_WIDTH: usize = 72;

/// Command line arguments for the Devths chat demo
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Devths chat demo: an optimistic-send conversation over a simulated transport.",
    long_about = "Interactive demo for the Devths conversation engine.\n\n\
    Messages are appended optimistically and confirmed by a simulated transport\n\
    with configurable latency and failure rate. Failed sends can be retried or\n\
    discarded. Commands: /retry <id>, /discard <id>, /del <id>, /questions, /quit."
)]
struct Args {
    /// Log file path; stdout stays reserved for the transcript
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Simulated delivery latency in milliseconds
    #[arg(long, default_value_t = 800)]
    latency_ms: u64,

    /// Fraction of deliveries that fail, 0.0 to 1.0
    #[arg(long, default_value_t = 0.2)]
    failure_rate: f64,

    /// Open the AI analysis chat instead of a plain room
    #[arg(long)]
    analysis: bool,
}

/// Load the stored profile or ask for a display name on first run.
fn resolve_profile() -> Result<Profile> {
    if let Some(profile) = load_profile()? {
        return Ok(profile);
    }
    eprintln!("표시할 이름을 입력하세요:");
    let name = utils::read_line()?;
    let name = if name.is_empty() { "나".to_string() } else { name };
    let profile = Profile::new("user1", &name);
    save_profile(&profile)?;
    Ok(profile)
}

fn print_message(message: &Message, own: bool) {
    let stamp = format::clock_label(message.timestamp.with_timezone(&Local));
    let body = format::truncate(&message.content, format::MESSAGE_COLLAPSE_LIMIT);
    let body = textwrap::fill(&body, BUBBLE_WIDTH);
    let marker = match message.status {
        DeliveryStatus::Sending if own => " (전송 중...)",
        _ => "",
    };
    println!("[{}] {}{}", stamp, message.sender_name, marker);
    for line in body.lines() {
        println!("    {}", line);
    }
    if !message.attachments.is_empty() {
        println!("    (첨부 {}개)", message.attachments.len());
    }
}

/// Resolve a user-typed id prefix to a full message id.
async fn find_message_id(session: &ChatSession, prefix: &str) -> Option<String> {
    session
        .messages()
        .await
        .iter()
        .find(|message| message.id.starts_with(prefix))
        .map(|message| message.id.clone())
}

async fn handle_line(
    line: &str,
    session: &ChatSession,
    assistant: Option<&AssistantResponder>,
) -> Result<bool> {
    if line == "/quit" {
        return Ok(true);
    }

    if line == "/questions" {
        match assistant {
            Some(assistant) => assistant.interview_questions(),
            None => println!("면접 질문 생성은 --analysis 모드에서만 가능합니다."),
        }
        return Ok(false);
    }

    if let Some(prefix) = line.strip_prefix("/retry ") {
        match find_message_id(session, prefix.trim()).await {
            Some(id) => {
                if let Err(e) = session.retry_message(&id).await {
                    println!("재전송할 수 없습니다: {}", e);
                }
            }
            None => println!("해당 메시지를 찾을 수 없습니다."),
        }
        return Ok(false);
    }

    if let Some(prefix) = line.strip_prefix("/discard ") {
        match find_message_id(session, prefix.trim()).await {
            Some(id) => {
                if let Err(e) = session.discard_message(&id).await {
                    println!("삭제할 수 없습니다: {}", e);
                }
            }
            None => println!("해당 메시지를 찾을 수 없습니다."),
        }
        return Ok(false);
    }

    if let Some(prefix) = line.strip_prefix("/del ") {
        match find_message_id(session, prefix.trim()).await {
            Some(id) => {
                if let Err(e) = session.delete_message(&id).await {
                    println!("삭제할 수 없습니다: {}", e);
                }
            }
            None => println!("해당 메시지를 찾을 수 없습니다."),
        }
        return Ok(false);
    }

    if let Err(e) = session.send_message(line, Vec::new()).await {
        println!("전송할 수 없습니다: {}", e);
    }
    Ok(false)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_file_path = args
        .log_file
        .clone()
        .unwrap_or_else(|| PathBuf::from("devths-chat.log"));
    utils::setup_logging(log_file_path.to_str(), LevelFilter::Debug)?;

    info!("Devths chat demo starting up");
    info!("Logging to file: {}", log_file_path.display());

    let profile = resolve_profile()?;
    let transport = Arc::new(SimulatedTransport::new(
        Duration::from_millis(args.latency_ms),
        args.failure_rate,
    ));

    let room_id = if args.analysis { "analysis-1" } else { "room-1" };
    let (session, event_rx) = ChatSession::new(
        room_id,
        &profile.user_id,
        &profile.display_name,
        transport,
    );

    let assistant = args.analysis.then(|| {
        let responder =
            AssistantResponder::new(session.clone(), Duration::from_millis(1500));
        responder.greet();
        responder
    });

    println!("== {} ==", if args.analysis { "새 분석 결과" } else { "채팅방" });
    println!("메시지를 입력하고 Enter를 누르세요. /quit 로 종료합니다.");

    // Blocking stdin reader feeding the async loop
    let (input_tx, mut input_rx) = mpsc::channel::<String>(16);
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        loop {
            let mut line = String::new();
            match stdin.read_line(&mut line) {
                Ok(0) => break, // stdin closed
                Ok(_) => {
                    if input_tx.blocking_send(line.trim().to_string()).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("failed to read input: {}", e);
                    break;
                }
            }
        }
    });

    let mut events = ReceiverStream::new(event_rx);
    let mut last_day: Option<chrono::DateTime<Local>> = None;

    loop {
        tokio::select! {
            maybe_line = input_rx.recv() => {
                match maybe_line {
                    Some(line) if line.is_empty() => {}
                    Some(line) => {
                        if handle_line(&line, &session, assistant.as_ref()).await? {
                            break;
                        }
                    }
                    None => break,
                }
            }
            Some(event) = events.next() => {
                match event {
                    ChatEvent::MessageAppended(message) => {
                        let local = message.timestamp.with_timezone(&Local);
                        if format::should_show_divider(local, last_day) {
                            println!("--- {} ---", format::date_divider_label(local, Local::now()));
                        }
                        last_day = Some(local);
                        let own = message.sender_id == profile.user_id;
                        print_message(&message, own);
                    }
                    ChatEvent::StatusChanged { message_id, status } => {
                        let short = &message_id[..8.min(message_id.len())];
                        match status {
                            DeliveryStatus::Delivered => {
                                println!("    ({} 전송 완료)", short);
                                if let (Some(assistant), Some(message)) =
                                    (assistant.as_ref(), session.message(&message_id).await)
                                {
                                    assistant.answer(&message.content);
                                }
                            }
                            DeliveryStatus::Failed => {
                                println!(
                                    "    ({} 전송 실패: /retry {} 또는 /discard {})",
                                    short, short, short
                                );
                            }
                            DeliveryStatus::Sending => {
                                println!("    ({} 재전송 중...)", short);
                            }
                        }
                    }
                    ChatEvent::MessageDeleted { message_id } => {
                        info!("message {} deleted", message_id);
                        println!("    (메시지를 삭제했습니다)");
                    }
                    ChatEvent::MessageRemoved { message_id } => {
                        info!("failed message {} discarded", message_id);
                        println!("    (실패한 메시지를 삭제했습니다)");
                    }
                    ChatEvent::ReadCountChanged { message_id, read_count } => {
                        let short = &message_id[..8.min(message_id.len())];
                        println!("    ({} 읽지 않음 {})", short, format::read_count_label(read_count));
                    }
                    ChatEvent::Typing { user_id, status } => {
                        if user_id == ASSISTANT_ID && status.is_typing() {
                            println!("    AI 분석 입력 중...");
                        }
                    }
                }
            }
            else => break,
        }
    }

    session.shutdown();
    info!("Devths chat demo exiting");
    Ok(())
}
