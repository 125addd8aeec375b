//! Deferred, one-shot file operations.
//!
//! Planning fills an [`OperationStack`]; nothing touches the disk until the
//! stack is executed. Execution consumes the stack from the front so a stack
//! can only ever be run once.

use std::collections::{BTreeSet, VecDeque};
use std::fmt;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{ReleaseError, Result};

/// A mutation that can be applied against an execution context `C`
pub trait Apply<C> {
    /// Perform the mutation on behalf of repository `repo`
    fn apply(&self, repo: &str, ctx: &mut C) -> Result<()>;
}

/// A single queued mutation of one file in one repository
#[derive(Debug)]
pub struct Operation<M> {
    path: PathBuf,
    repo: String,
    mutation: M,
    executed: bool,
}

impl<M> Operation<M> {
    pub fn new(path: impl Into<PathBuf>, repo: impl Into<String>, mutation: M) -> Self {
        Operation {
            path: path.into(),
            repo: repo.into(),
            mutation,
            executed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    pub fn mutation(&self) -> &M {
        &self.mutation
    }

    pub fn is_executed(&self) -> bool {
        self.executed
    }

    /// Run the mutation. A second call fails with `AlreadyExecuted`.
    pub fn invoke<C>(&mut self, ctx: &mut C) -> Result<()>
    where
        M: Apply<C>,
    {
        if self.executed {
            return Err(ReleaseError::AlreadyExecuted(format!(
                "{} ({})",
                self.path.display(),
                self.repo
            )));
        }
        self.executed = true;
        self.mutation.apply(&self.repo, ctx)
    }

    fn validate(&self) -> Result<()> {
        if self.repo.is_empty() {
            return Err(ReleaseError::InvalidOperation(format!(
                "no repository for {}",
                self.path.display()
            )));
        }
        if self.path.as_os_str().is_empty() {
            return Err(ReleaseError::InvalidOperation(format!(
                "no file for repository {}",
                self.repo
            )));
        }
        if self.executed {
            return Err(ReleaseError::InvalidOperation(format!(
                "{} ({}) has already run",
                self.path.display(),
                self.repo
            )));
        }
        Ok(())
    }
}

impl<M: fmt::Debug> fmt::Display for Operation<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "file: {}, repo: {}, operation: {:?}",
            self.path.display(),
            self.repo,
            self.mutation
        )
    }
}

/// FIFO of pending operations
#[derive(Debug)]
pub struct OperationStack<M> {
    ops: VecDeque<Operation<M>>,
    position: usize,
}

impl<M> Default for OperationStack<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> OperationStack<M> {
    pub fn new() -> Self {
        OperationStack {
            ops: VecDeque::new(),
            position: 0,
        }
    }

    /// Queue an operation at the back
    pub fn add(&mut self, op: Operation<M>) -> Result<()> {
        op.validate()?;
        self.ops.push_back(op);
        Ok(())
    }

    /// Shorthand for `add(Operation::new(..))`
    pub fn push(
        &mut self,
        path: impl Into<PathBuf>,
        repo: impl Into<String>,
        mutation: M,
    ) -> Result<()> {
        self.add(Operation::new(path, repo, mutation))
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Number of operations executed so far
    pub fn position(&self) -> usize {
        self.position
    }

    /// Pending operations in execution order
    pub fn iter(&self) -> impl Iterator<Item = &Operation<M>> {
        self.ops.iter()
    }

    /// Files the pending operations will write
    pub fn files_touched(&self) -> BTreeSet<PathBuf> {
        self.ops.iter().map(|op| op.path.clone()).collect()
    }

    /// Repositories the pending operations belong to
    pub fn repos_touched(&self) -> BTreeSet<String> {
        self.ops.iter().map(|op| op.repo.clone()).collect()
    }

    /// Repositories in the order they first appear in the stack
    pub fn repo_sequence(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.ops
            .iter()
            .filter(|op| seen.insert(op.repo.clone()))
            .map(|op| op.repo.clone())
            .collect()
    }

    /// Drain the stack front to back, running each operation as it is yielded
    pub fn execute<'a, C>(&'a mut self, ctx: &'a mut C) -> Execute<'a, M, C> {
        Execute { stack: self, ctx }
    }

    /// Run every operation, stopping at the first failure. Operations after the
    /// failing one stay queued. Returns how many operations ran.
    pub fn run<C>(&mut self, ctx: &mut C) -> Result<usize>
    where
        M: Apply<C> + fmt::Debug,
    {
        let mut count = 0;
        for result in self.execute(ctx) {
            result?;
            count += 1;
        }
        Ok(count)
    }
}

/// Iterator returned by [`OperationStack::execute`]
pub struct Execute<'a, M, C> {
    stack: &'a mut OperationStack<M>,
    ctx: &'a mut C,
}

impl<M, C> Iterator for Execute<'_, M, C>
where
    M: Apply<C> + fmt::Debug,
{
    type Item = Result<()>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut op = self.stack.ops.pop_front()?;
        self.stack.position += 1;
        debug!("update operation {}: {}", self.stack.position, op);
        Some(op.invoke(self.ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Append(&'static str);

    impl Apply<Vec<String>> for Append {
        fn apply(&self, repo: &str, ctx: &mut Vec<String>) -> Result<()> {
            ctx.push(format!("{}:{}", repo, self.0));
            Ok(())
        }
    }

    #[derive(Debug)]
    struct Fail;

    impl Apply<Vec<String>> for Fail {
        fn apply(&self, _repo: &str, _ctx: &mut Vec<String>) -> Result<()> {
            Err(ReleaseError::InvalidOperation("boom".to_string()))
        }
    }

    fn stack() -> OperationStack<Append> {
        let mut stack = OperationStack::new();
        stack.push("a/CHANGELOG.md", "a", Append("changelog")).unwrap();
        stack.push("a/a/__init__.py", "a", Append("init")).unwrap();
        stack.push("b/b/__init__.py", "b", Append("init")).unwrap();
        stack.push("b/setup.py", "b", Append("setup")).unwrap();
        stack.push("c/c/__init__.py", "c", Append("init")).unwrap();
        stack
    }

    #[test]
    fn test_operation_invoked_twice() {
        let mut op = Operation::new("x/setup.py", "x", Append("setup"));
        let mut log: Vec<String> = Vec::new();
        op.invoke(&mut log).unwrap();
        let err = op.invoke(&mut log).unwrap_err();
        assert!(matches!(err, ReleaseError::AlreadyExecuted(_)));
        assert_eq!(log, vec!["x:setup"]);
    }

    #[test]
    fn test_add_rejects_malformed_operations() {
        let mut stack = OperationStack::new();
        assert!(matches!(
            stack.push("", "x", Append("a")),
            Err(ReleaseError::InvalidOperation(_))
        ));
        assert!(matches!(
            stack.push("x/setup.py", "", Append("a")),
            Err(ReleaseError::InvalidOperation(_))
        ));

        let mut op = Operation::new("x/setup.py", "x", Append("a"));
        op.invoke(&mut Vec::<String>::new()).unwrap();
        assert!(matches!(stack.add(op), Err(ReleaseError::InvalidOperation(_))));
        assert!(stack.is_empty());
    }

    #[test]
    fn test_introspection() {
        let stack = stack();
        assert_eq!(stack.len(), 5);
        assert_eq!(stack.files_touched().len(), 5);
        assert_eq!(
            stack.repos_touched().into_iter().collect::<Vec<_>>(),
            vec!["a", "b", "c"]
        );
        assert_eq!(stack.repo_sequence(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_repo_sequence_keeps_first_seen_order() {
        let mut stack = OperationStack::new();
        stack.push("z/x", "z", Append("1")).unwrap();
        stack.push("a/x", "a", Append("2")).unwrap();
        stack.push("z/y", "z", Append("3")).unwrap();
        assert_eq!(stack.repo_sequence(), vec!["z", "a"]);
    }

    #[test]
    fn test_execute_drains_in_fifo_order() {
        let mut stack = stack();
        let mut log: Vec<String> = Vec::new();
        assert_eq!(stack.run(&mut log).unwrap(), 5);
        assert_eq!(
            log,
            vec!["a:changelog", "a:init", "b:init", "b:setup", "c:init"]
        );
        assert!(stack.is_empty());
        assert_eq!(stack.position(), 5);
        assert_eq!(stack.execute(&mut log).count(), 0);
    }

    #[derive(Debug)]
    enum Step {
        Ok(&'static str),
        Fail,
    }

    impl Apply<Vec<String>> for Step {
        fn apply(&self, repo: &str, ctx: &mut Vec<String>) -> Result<()> {
            match self {
                Step::Ok(name) => Append(*name).apply(repo, ctx),
                Step::Fail => Fail.apply(repo, ctx),
            }
        }
    }

    #[test]
    fn test_run_stops_at_first_failure() {
        let mut stack = OperationStack::new();
        stack.push("a/1", "a", Step::Ok("one")).unwrap();
        stack.push("a/2", "a", Step::Fail).unwrap();
        stack.push("a/3", "a", Step::Ok("three")).unwrap();

        let mut log: Vec<String> = Vec::new();
        assert!(stack.run(&mut log).is_err());
        assert_eq!(log, vec!["a:one"]);
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.files_touched().into_iter().next().unwrap(), PathBuf::from("a/3"));
    }
}
