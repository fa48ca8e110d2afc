use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use bundlegate::errors::Result;
use bundlegate::exec::{Invocation, ProcessOutput, ProcessRunner};
use bundlegate::types::ProcessStatus;

type Hook = Box<dyn Fn(&Invocation) + Send + Sync>;

/// A fake bundler that:
/// - records every invocation it receives
/// - answers with queued outputs, falling back to a default output
/// - optionally runs a hook (e.g. to touch files mid-build).
pub struct FakeRunner {
    invocations: Arc<Mutex<Vec<Invocation>>>,
    queued: Mutex<VecDeque<ProcessOutput>>,
    default: ProcessOutput,
    hook: Option<Hook>,
}

pub fn output(status: ProcessStatus, stdout: &str, stderr: &str) -> ProcessOutput {
    ProcessOutput {
        status,
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
    }
}

impl FakeRunner {
    fn with_default(default: ProcessOutput) -> Self {
        Self {
            invocations: Arc::new(Mutex::new(Vec::new())),
            queued: Mutex::new(VecDeque::new()),
            default,
            hook: None,
        }
    }

    /// Every run exits 0.
    pub fn succeeding() -> Self {
        Self::with_default(output(ProcessStatus::Success, "compiled", ""))
    }

    /// Every run exits with `code`.
    pub fn failing(code: i32) -> Self {
        Self::with_default(output(ProcessStatus::Failed(code), "", "Module build failed"))
    }

    /// Answer the next run with `out` instead of the default.
    pub fn then(self, out: ProcessOutput) -> Self {
        self.queued.lock().unwrap().push_back(out);
        self
    }

    pub fn on_run(mut self, hook: impl Fn(&Invocation) + Send + Sync + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    pub fn calls(&self) -> usize {
        self.invocations.lock().unwrap().len()
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }

    pub fn last_invocation(&self) -> Option<Invocation> {
        self.invocations.lock().unwrap().last().cloned()
    }
}

impl ProcessRunner for FakeRunner {
    fn run(&self, invocation: &Invocation) -> Result<ProcessOutput> {
        self.invocations.lock().unwrap().push(invocation.clone());
        if let Some(hook) = &self.hook {
            hook(invocation);
        }
        let next = self.queued.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(|| self.default.clone()))
    }
}
