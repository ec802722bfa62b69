//! Composable transforms over a [`ComicInfo`].
//!
//! A [`MutationStep`] is a labelled, reusable closure. Setting a field, validating and
//! rendering a preview are all ordinary steps; [`MutationStep::join`] chains them into the
//! single transform an archive transaction applies.

use std::borrow::Cow;
use std::fmt;
use std::io::Write;
use std::sync::Mutex;

use crate::codec::FieldAssignment;
use crate::error::{CbzError, Result};
use crate::types::{ComicInfo, FieldValue, Schema};

type StepFn = dyn Fn(&mut ComicInfo) -> Result<()> + Send + Sync;

pub struct MutationStep {
    label: Cow<'static, str>,
    op: Box<StepFn>,
}

impl MutationStep {
    pub fn new<L, F>(label: L, op: F) -> Self
    where
        L: Into<Cow<'static, str>>,
        F: Fn(&mut ComicInfo) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            op: Box::new(op),
        }
    }

    /// Name used when this step is reported as the cause of a failure.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn apply(&self, info: &mut ComicInfo) -> Result<()> {
        (self.op)(info)
    }

    /// A step that changes nothing.
    #[must_use]
    pub fn noop() -> Self {
        Self::new("noop", |_| Ok(()))
    }

    /// Overwrite the attribute called `name`.
    ///
    /// Fails when the aggregate has no such attribute or when the value's category differs
    /// from the attribute's declared type. Enumerated values are not checked here.
    pub fn set_field(name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        let name = name.into();
        let value = value.into();
        let label = format!("set {name}");
        Self::new(label, move |info| {
            let spec = ComicInfo::field(&name).ok_or_else(|| CbzError::UnknownField {
                field: name.clone(),
            })?;
            spec.get_mut(info).assign(spec.name, value.clone())?;
            tracing::trace!(target: "cbz::pipeline", field = spec.name, "field set");
            Ok(())
        })
    }

    /// One `set_field` step per parsed operand, in order.
    pub fn from_assignments(assignments: impl IntoIterator<Item = FieldAssignment>) -> Vec<Self> {
        assignments
            .into_iter()
            .map(|assignment| Self::set_field(assignment.name, assignment.value))
            .collect()
    }

    /// Run `steps` left to right, stopping at the first failure.
    ///
    /// The error names the failing step by position and label.
    #[must_use]
    pub fn join(steps: Vec<MutationStep>) -> Self {
        let label = format!("join({})", steps.len());
        Self::new(label, move |info| {
            for (index, step) in steps.iter().enumerate() {
                step.apply(info).map_err(|source| CbzError::StepFailed {
                    index,
                    step: step.label().to_owned(),
                    source: Box::new(source),
                })?;
            }
            Ok(())
        })
    }

    /// Check enumerated attributes against their closed sets.
    #[must_use]
    pub fn validate() -> Self {
        Self::new("validate", |info| info.validate())
    }

    /// Write the XML form of the aggregate to `out`, one document per application.
    pub fn render<W>(out: W) -> Self
    where
        W: Write + Send + 'static,
    {
        let out = Mutex::new(out);
        Self::new("render", move |info| {
            let xml = info.to_xml()?;
            let mut out = out
                .lock()
                .map_err(|_| std::io::Error::other("render output lock poisoned"))?;
            out.write_all(&xml)?;
            out.write_all(b"\n")?;
            out.flush()?;
            Ok(())
        })
    }

    /// [`MutationStep::render`] on standard output.
    #[must_use]
    pub fn render_stdout() -> Self {
        Self::render(std::io::stdout())
    }
}

impl fmt::Debug for MutationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationStep")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}
