//! Frame-driven animations
//!
//! Animations are grouped into stacks. A stack is opened with
//! [`AnimationServer::begin`], filled, and handed over with
//! [`AnimationServer::commit`]; from then on the scene advances it once per
//! drawn frame until every animation in it reports
//! [`AnimationStatus::Finished`].

/// Progress reported after advancing an animation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationStatus {
    /// Wants more frames
    Running,
    /// Done; the animation is dropped
    Finished,
}

/// Something advanced once per frame
pub trait Animation {
    /// Advance by `timestep` seconds
    fn advance(&mut self, timestep: f64) -> AnimationStatus;
}

impl<F> Animation for F
where
    F: FnMut(f64) -> AnimationStatus,
{
    fn advance(&mut self, timestep: f64) -> AnimationStatus {
        self(timestep)
    }
}

/// Animations committed together
#[derive(Default)]
pub struct AnimationStack {
    animations: Vec<Box<dyn Animation>>,
}

impl AnimationStack {
    /// Add an animation
    pub fn push(&mut self, animation: impl Animation + 'static) {
        self.animations.push(Box::new(animation));
    }

    /// Number of animations still running
    pub fn len(&self) -> usize {
        self.animations.len()
    }

    /// Check if every animation finished
    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }

    fn advance(&mut self, timestep: f64) {
        self.animations
            .retain_mut(|animation| animation.advance(timestep) == AnimationStatus::Running);
    }
}

impl std::fmt::Debug for AnimationStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationStack")
            .field("animations", &self.animations.len())
            .finish()
    }
}

/// Runs committed animation stacks
#[derive(Debug, Default)]
pub struct AnimationServer {
    pending: Vec<AnimationStack>,
    running: Vec<AnimationStack>,
}

impl AnimationServer {
    /// Create an idle server
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new stack and return it for filling
    ///
    /// Stacks nest: the most recently opened one is committed first.
    pub fn begin(&mut self) -> &mut AnimationStack {
        self.pending.push(AnimationStack::default());
        let last = self.pending.len() - 1;
        &mut self.pending[last]
    }

    /// Stack opened by the last [`begin`](Self::begin), if any
    pub fn current(&mut self) -> Option<&mut AnimationStack> {
        self.pending.last_mut()
    }

    /// Start running the most recently opened stack
    ///
    /// Returns `false` if no stack is open.
    pub fn commit(&mut self) -> bool {
        match self.pending.pop() {
            Some(stack) => {
                if !stack.is_empty() {
                    self.running.push(stack);
                }
                true
            }
            None => false,
        }
    }

    /// Advance every running stack by one frame
    pub fn run(&mut self, timestep: f64) {
        for stack in &mut self.running {
            stack.advance(timestep);
        }
        self.running.retain(|stack| !stack.is_empty());
    }

    /// Number of running stacks
    pub fn running(&self) -> usize {
        self.running.len()
    }

    /// Check if nothing is running or pending
    pub fn is_idle(&self) -> bool {
        self.running.is_empty() && self.pending.is_empty()
    }

    /// Drop all pending and running stacks
    pub fn clear(&mut self) {
        self.pending.clear();
        self.running.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn countdown(frames: u32, ticks: Rc<Cell<u32>>) -> impl FnMut(f64) -> AnimationStatus {
        let mut left = frames;
        move |_| {
            ticks.set(ticks.get() + 1);
            left -= 1;
            if left == 0 {
                AnimationStatus::Finished
            } else {
                AnimationStatus::Running
            }
        }
    }

    #[test]
    fn test_uncommitted_stack_does_not_run() {
        let ticks = Rc::new(Cell::new(0));
        let mut server = AnimationServer::new();
        server.begin().push(countdown(3, ticks.clone()));

        server.run(0.1);
        assert_eq!(ticks.get(), 0);

        assert!(server.commit());
        server.run(0.1);
        assert_eq!(ticks.get(), 1);
    }

    #[test]
    fn test_finished_stacks_are_dropped() {
        let ticks = Rc::new(Cell::new(0));
        let mut server = AnimationServer::new();
        let stack = server.begin();
        stack.push(countdown(1, ticks.clone()));
        stack.push(countdown(2, ticks.clone()));
        server.commit();

        server.run(0.1);
        assert_eq!(server.running(), 1);
        server.run(0.1);
        assert_eq!(server.running(), 0);
        assert!(server.is_idle());
        assert_eq!(ticks.get(), 3);
    }

    #[test]
    fn test_commit_without_begin() {
        let mut server = AnimationServer::new();
        assert!(!server.commit());
    }
}
