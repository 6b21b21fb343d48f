use env::Env;
use model::max_value;
use model::traits::{Actor, QFunction};
use model::Error;
use serde::{Deserialize, Serialize};

/// Averages over the trials of one Monte Carlo evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub mean_total_reward: f64,
    pub mean_discounted_reward: f64,
    /// Mean of `max_a Q(s0, a)` over the trials' initial states.
    pub mean_initial_value: f64,
}

/// Rolls out the greedy policy of `q` for `n_trials` full episodes.
///
/// Episodes run until the environment reports termination or truncation,
/// so `env` must end its episodes on its own (wrap it in a
/// [`env::TimeLimitedWrapper`] when it may not).
pub fn monte_carlo<E, Q>(env: &mut E, q: &Q, n_trials: u32, gamma: f64) -> Result<Evaluation, Error>
where
    E: Env + ?Sized,
    Q: QFunction + ?Sized,
{
    let mut total_reward_sum = 0.0;
    let mut discounted_reward_sum = 0.0;
    let mut initial_value_sum = 0.0;
    for _ in 0..n_trials {
        let mut state = env.reset();
        initial_value_sum += f64::from(max_value(&q.q_values(&state)?));
        let mut total_reward = 0.0;
        let mut discounted_reward = 0.0;
        let mut discount = 1.0;
        loop {
            let step = env.step(q.best_action(&state)?);
            total_reward += step.reward;
            discounted_reward += discount * step.reward;
            discount *= gamma;
            if step.status.is_done() {
                break;
            }
            state = step.next_state;
        }
        total_reward_sum += total_reward;
        discounted_reward_sum += discounted_reward;
    }
    let n = f64::from(n_trials.max(1));
    Ok(Evaluation {
        mean_total_reward: total_reward_sum / n,
        mean_discounted_reward: discounted_reward_sum / n,
        mean_initial_value: initial_value_sum / n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use env::{ActionSpace, Done, Status, Step};
    use replay_data::State;

    // pays the chosen action as reward for three steps
    struct ThreeSteps {
        t: u32,
        resets: u32,
    }

    impl Env for ThreeSteps {
        fn observation_dim(&self) -> usize {
            1
        }
        fn action_space(&self) -> ActionSpace {
            ActionSpace::new(3)
        }
        fn reset(&mut self) -> State {
            self.t = 0;
            self.resets += 1;
            vec![0.0]
        }
        fn step(&mut self, action: usize) -> Step {
            self.t += 1;
            Step {
                next_state: vec![self.t as f32],
                reward: action as f64,
                status: if self.t == 3 {
                    Status::Done(Done::Truncated)
                } else {
                    Status::Running
                },
            }
        }
    }

    struct Prefers(usize, f32);

    impl QFunction for Prefers {
        fn n_actions(&self) -> usize {
            3
        }
        fn q_values(&self, _state: &[f32]) -> Result<Vec<f32>, Error> {
            let mut q = vec![0.0; 3];
            q[self.0] = self.1;
            Ok(q)
        }
    }

    #[test]
    fn rolls_out_the_greedy_policy() {
        let mut env = ThreeSteps { t: 0, resets: 0 };
        let eval = monte_carlo(&mut env, &Prefers(2, 7.0), 4, 0.5).unwrap();
        assert_eq!(env.resets, 4);
        assert_eq!(eval.mean_total_reward, 6.0);
        // 2 + 0.5 * 2 + 0.25 * 2
        assert_eq!(eval.mean_discounted_reward, 3.5);
        assert_eq!(eval.mean_initial_value, 7.0);
    }

    #[test]
    fn zero_trials_yield_zeros() {
        let mut env = ThreeSteps { t: 0, resets: 0 };
        let eval = monte_carlo(&mut env, &Prefers(1, 1.0), 0, 0.9).unwrap();
        assert_eq!(env.resets, 0);
        assert_eq!(eval.mean_total_reward, 0.0);
    }
}
