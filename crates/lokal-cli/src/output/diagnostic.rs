//! Miette reports for diagnostics raised while rendering a template.

use std::error::Error;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::iter::once;

use miette::{Diagnostic, LabeledSpan, NamedSource, Severity, SourceCode};

/// A lokal [`Diagnostic`](lokal::Diagnostic) located in the template of one
/// key, rendered with the template as source context.
#[derive(Debug)]
pub struct TemplateDiagnostic {
    src: NamedSource<String>,
    span: Option<(usize, usize)>,
    diagnostic: lokal::Diagnostic,
}

impl TemplateDiagnostic {
    /// Wraps a diagnostic found while rendering `template` for `key`.
    ///
    /// Only diagnostics raised in the top-level template point into it; those
    /// raised in expanded references are reported without a label.
    pub fn new(key: &str, template: &str, diagnostic: lokal::Diagnostic) -> Self {
        let span = diagnostic
            .span
            .as_ref()
            .filter(|_| diagnostic.depth == 0)
            .filter(|span| span.end <= template.len())
            .map(|span| (span.start, span.len().max(1)));
        Self {
            src: NamedSource::new(key, template.to_string()),
            span,
            diagnostic,
        }
    }
}

impl Display for TemplateDiagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.diagnostic.message)
    }
}

impl Error for TemplateDiagnostic {}

impl Diagnostic for TemplateDiagnostic {
    fn code<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        Some(Box::new(format!("lokal::{}", self.diagnostic.kind)))
    }

    fn severity(&self) -> Option<Severity> {
        Some(match self.diagnostic.severity {
            lokal::Severity::Warning => Severity::Warning,
            lokal::Severity::Error | lokal::Severity::Fatal => Severity::Error,
        })
    }

    fn help<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        self.diagnostic
            .cause
            .as_ref()
            .map(|cause| Box::new(cause) as Box<dyn Display + 'a>)
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        Some(&self.src)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let (offset, len) = self.span?;
        let label = LabeledSpan::new(Some(self.diagnostic.kind.to_string()), offset, len);
        Some(Box::new(once(label)))
    }
}
