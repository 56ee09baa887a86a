// Canned responder for the AI analysis chat. Replies are fixed strings the
// real service would compute; they are delivered through the normal receive
// path after a short composing delay so the screen behaves as it would
// against the actual backend.

use log::{debug, error};
use tokio::time::Duration;

use super::{ChatSession, TypingStatus};

pub const ASSISTANT_ID: &str = "assistant";
pub const ASSISTANT_NAME: &str = "AI 분석";

/// Opening analysis report posted when an analysis chat is created.
pub const ANALYSIS_GREETING: &str = "안녕하세요! 이력서와 채용 공고 분석이 완료되었습니다.\n\n\
**📋 이력서 분석 결과**\n\
- 프론트엔드 개발 경험 3년\n\
- React, TypeScript 숙련도 높음\n\
- 협업 프로젝트 경험 다수\n\n\
**💼 채용 공고 매칭도**\n\
- 기술 스택 일치율: 85%\n\
- 요구 경험 일치율: 90%\n\
- 추가 학습 권장: GraphQL, Next.js\n\n\
**💡 추천 사항**\n\
1. 포트폴리오에 프로젝트 성과 수치화 필요\n\
2. 자기소개서에 협업 경험 강조\n\
3. 기술 면접 대비 알고리즘 복습 권장\n\n\
더 자세한 분석이나 면접 질문 생성을 원하시면 말씀해주세요!";

/// Canned interview-question sheet for the 면접 질문 생성 action.
pub const INTERVIEW_QUESTIONS: &str = "**🎯 예상 면접 질문**\n\n\
**기술 면접**\n\
1. React의 Virtual DOM이 무엇이고, 어떻게 동작하는지 설명해주세요.\n\
2. TypeScript를 사용하면서 얻은 이점과 어려웠던 점은 무엇인가요?\n\
3. 상태 관리 라이브러리를 선택할 때 고려하는 기준은 무엇인가요?\n\n\
**프로젝트 경험**\n\
4. 가장 어려웠던 프로젝트와 그 해결 과정을 설명해주세요.\n\
5. 팀 프로젝트에서 갈등이 발생했을 때 어떻게 해결했나요?\n\n\
**인성 면접**\n\
6. 5년 후 본인의 모습을 어떻게 그리고 계신가요?\n\
7. 우리 회사에 지원한 이유는 무엇인가요?\n\n\
각 질문에 대한 모범 답변이나 피드백이 필요하시면 말씀해주세요!";

/// Reply quoting the user's question.
pub fn reply_to(content: &str) -> String {
    format!(
        "\"{}\"에 대한 답변입니다.\n\n분석 내용을 바탕으로 추가 정보를 제공해드릴게요. \
더 궁금한 점이 있으시면 말씀해주세요!",
        content
    )
}

/// Posts assistant messages into a session after a composing delay. One reply
/// is produced per trigger; a session that has been shut down swallows any
/// still-scheduled replies.
pub struct AssistantResponder {
    session: ChatSession,
    delay: Duration,
}

impl AssistantResponder {
    pub fn new(session: ChatSession, delay: Duration) -> Self {
        AssistantResponder { session, delay }
    }

    /// Post the opening analysis report.
    pub fn greet(&self) {
        self.deliver(ANALYSIS_GREETING.to_string());
    }

    /// Answer one user message.
    pub fn answer(&self, user_content: &str) {
        self.deliver(reply_to(user_content));
    }

    /// Post the generated interview questions.
    pub fn interview_questions(&self) {
        self.deliver(INTERVIEW_QUESTIONS.to_string());
    }

    fn deliver(&self, content: String) {
        let session = self.session.clone();
        let delay = self.delay;
        tokio::spawn(async move {
            session.notify_typing(ASSISTANT_ID, TypingStatus::Composing);
            tokio::select! {
                _ = session.shutdown.cancelled() => {
                    debug!("assistant reply dropped, session shut down");
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }
            session.notify_typing(ASSISTANT_ID, TypingStatus::Inactive);
            if let Err(e) = session
                .receive_message(ASSISTANT_ID, ASSISTANT_NAME, &content, Vec::new())
                .await
            {
                error!("failed to post assistant reply: {}", e);
            }
        });
    }
}
