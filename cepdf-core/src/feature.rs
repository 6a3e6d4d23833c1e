use std::path::PathBuf;

/// Toolbar actions that only acknowledge the request on the status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureAction {
    AddComment { text: Option<String> },
    SendForComments,
    FillAndSign,
    EditPdf,
    ExportPdf { target: Option<PathBuf> },
    AiAssistant,
    GenerateSummary,
    CreatePdf { target: Option<PathBuf> },
    CombineFiles { sources: Vec<PathBuf> },
    Share,
    AddStamp,
}

impl FeatureAction {
    /// Creating and combining work on files picked by the user, not on the open document.
    pub fn requires_document(&self) -> bool {
        !matches!(
            self,
            FeatureAction::CreatePdf { .. } | FeatureAction::CombineFiles { .. }
        )
    }

    /// Status line text, or `None` when the input dialog was cancelled.
    pub fn status_message(&self) -> Option<String> {
        match self {
            FeatureAction::AddComment { text } => {
                text.as_ref().map(|text| format!("Comment added: {text}"))
            }
            FeatureAction::SendForComments => Some("Sending for comments...".to_string()),
            FeatureAction::FillAndSign => Some("Fill & Sign mode activated".to_string()),
            FeatureAction::EditPdf => Some("Edit mode activated".to_string()),
            FeatureAction::ExportPdf { target } => target
                .as_ref()
                .map(|target| format!("Exporting PDF to {}", target.display())),
            FeatureAction::AiAssistant => Some("AI Assistant activated".to_string()),
            FeatureAction::GenerateSummary => Some("Generating summary...".to_string()),
            FeatureAction::CreatePdf { target } => target
                .as_ref()
                .map(|target| format!("Creating new PDF: {}", target.display())),
            FeatureAction::CombineFiles { sources } if sources.is_empty() => None,
            FeatureAction::CombineFiles { sources } => {
                Some(format!("Combining {} PDF files", sources.len()))
            }
            FeatureAction::Share => Some("Opening share dialog...".to_string()),
            FeatureAction::AddStamp => Some("Add stamp mode activated".to_string()),
        }
    }
}
