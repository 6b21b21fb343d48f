use crate::{ActionSpace, Done, Env, Status, Step};
use replay_data::State;

/// Truncates episodes of the wrapped environment after a fixed number of
/// steps.
pub struct TimeLimitedWrapper<E> {
    env: E,
    max_episode_steps: u32,
    truncation_timer: u32,
}

impl<E: Env> TimeLimitedWrapper<E> {
    pub fn new(env: E, max_episode_steps: u32) -> Self {
        assert!(max_episode_steps > 0, "max_episode_steps must be nonzero");
        Self {
            env,
            max_episode_steps,
            truncation_timer: 0,
        }
    }

    fn truncation_timer_exceeded_threshold(&self) -> bool {
        self.truncation_timer >= self.max_episode_steps
    }
}

impl<E: Env> Env for TimeLimitedWrapper<E> {
    fn observation_dim(&self) -> usize {
        self.env.observation_dim()
    }

    fn action_space(&self) -> ActionSpace {
        self.env.action_space()
    }

    fn reset(&mut self) -> State {
        self.truncation_timer = 0;
        self.env.reset()
    }

    fn step(&mut self, action: usize) -> Step {
        self.truncation_timer += 1;
        let mut step = self.env.step(action);
        // termination wins over truncation when both happen on the same step
        if step.status == Status::Running && self.truncation_timer_exceeded_threshold() {
            step.status = Status::Done(Done::Truncated);
        }
        step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        n: u32,
        terminal_at: u32,
    }

    impl Env for Counter {
        fn observation_dim(&self) -> usize {
            1
        }
        fn action_space(&self) -> ActionSpace {
            ActionSpace::new(2)
        }
        fn reset(&mut self) -> State {
            self.n = 0;
            vec![0.0]
        }
        fn step(&mut self, _action: usize) -> Step {
            self.n += 1;
            let status = if self.n == self.terminal_at {
                Status::Done(Done::Terminated)
            } else {
                Status::Running
            };
            Step {
                next_state: vec![self.n as f32],
                reward: 1.0,
                status,
            }
        }
    }

    fn run_episode<E: Env>(env: &mut E) -> (u32, Status) {
        env.reset();
        let mut steps = 0;
        loop {
            steps += 1;
            let step = env.step(0);
            if step.status.is_done() {
                return (steps, step.status);
            }
        }
    }

    #[test]
    fn truncates_after_max_steps() {
        let mut env = TimeLimitedWrapper::new(Counter { n: 0, terminal_at: 1000 }, 5);
        assert_eq!(run_episode(&mut env), (5, Status::Done(Done::Truncated)));
        // the timer restarts with every episode
        assert_eq!(run_episode(&mut env), (5, Status::Done(Done::Truncated)));
    }

    #[test]
    fn termination_passes_through() {
        let mut env = TimeLimitedWrapper::new(Counter { n: 0, terminal_at: 3 }, 10);
        assert_eq!(run_episode(&mut env), (3, Status::Done(Done::Terminated)));
    }

    #[test]
    fn termination_on_the_last_allowed_step_stays_termination() {
        let mut env = TimeLimitedWrapper::new(Counter { n: 0, terminal_at: 4 }, 4);
        assert_eq!(run_episode(&mut env), (4, Status::Done(Done::Terminated)));
    }
}
