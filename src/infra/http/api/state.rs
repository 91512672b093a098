use std::sync::Arc;

use crate::application::access::AccessService;
use crate::application::analysis::KnowledgeBaseService;
use crate::application::assistant::AssistantService;
use crate::application::questions::QuestionService;
use crate::cache::Clock;

#[derive(Clone)]
pub struct ApiState {
    pub access: Arc<AccessService>,
    pub questions: Arc<QuestionService>,
    pub knowledge: Arc<KnowledgeBaseService>,
    pub assistant: Arc<AssistantService>,
    pub clock: Arc<dyn Clock>,
}
