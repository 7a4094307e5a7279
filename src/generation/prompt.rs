//! Prompt assembly: fixed system instruction plus a user message built from the design
//! spec, the task's requirements and the stored output of its dependencies.

use crate::provider::ChatMessage;
use crate::store::TaskStore;
use crate::task::Task;
use tracing::warn;

/// Built-in system instruction.
pub const DEFAULT_SYSTEM_PROMPT: &str = "We need to break this design down into smaller \
concerns that we can prompt code generation LLMs with. Think about ways to split it, then \
write one section per modularizable part with the prompt in a code block, followed by any \
follow-up notes for the developers receiving the generated code. Modularize as small as \
reasonably possible, which usually means one prompt per page or per service. Be verbose \
and thorough.";

/// Builds the messages for one generation request.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    system_prompt: String,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM_PROMPT)
    }
}

impl PromptBuilder {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// `"{dep}: {text}"` for every dependency with stored, non-empty text.
    ///
    /// Absent or empty dependency text is logged and left out.
    pub fn dependency_context<'a>(
        &self,
        task: &Task,
        lookup: impl Fn(&str) -> Option<&'a str>,
    ) -> Vec<String> {
        let mut context = Vec::with_capacity(task.dependencies.len());
        for dep in &task.dependencies {
            match lookup(dep) {
                Some(text) if !text.trim().is_empty() => context.push(format!("{}: {}", dep, text)),
                _ => warn!(
                    task = %task.name,
                    dependency = %dep,
                    "Dependency output not found or empty; omitting it from the prompt"
                ),
            }
        }
        context
    }

    pub fn user_message(&self, spec_text: &str, task: &Task, dependency_context: &[String]) -> String {
        format!(
            "<context>{}</context>\n\nGenerate a detailed prompt for the following subspec: {}\n\nRequirements: {}\n\nDependencies: {}",
            spec_text,
            task.name,
            task.requirements,
            dependency_context.join(", ")
        )
    }

    /// System and user messages for `task`, pulling dependency text from `store`.
    pub fn build_messages(&self, spec_text: &str, task: &Task, store: &TaskStore) -> Vec<ChatMessage> {
        let deps = self.dependency_context(task, |name| store.get(name));
        vec![
            ChatMessage::system(self.system_prompt.clone()),
            ChatMessage::user(self.user_message(spec_text, task, &deps)),
        ]
    }
}
