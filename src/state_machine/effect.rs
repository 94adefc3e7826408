//! Effects produced by step transitions

use super::Step;
use crate::render::RenderRequest;

/// Effects to be executed after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Show the prompt for the step the session just entered
    ShowPrompt { step: Step },

    /// Hand the completed form to the renderer. The session ends here.
    DispatchRender { request: RenderRequest },
}
