use crate::{ActionSpace, Done, Env, Status, Step};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use replay_data::State;

const GRAVITY: f64 = 9.8;
const MASS_CART: f64 = 1.0;
const MASS_POLE: f64 = 0.1;
const TOTAL_MASS: f64 = MASS_CART + MASS_POLE;
// half the pole's length
const POLE_HALF_LENGTH: f64 = 0.5;
const POLE_MASS_LENGTH: f64 = MASS_POLE * POLE_HALF_LENGTH;
const FORCE_MAG: f64 = 10.0;
const TAU: f64 = 0.02;
const THETA_THRESHOLD_RADIANS: f64 = 12.0 * 2.0 * std::f64::consts::PI / 360.0;
const X_THRESHOLD: f64 = 2.4;

/// The classic cart-pole balancing task, integrated with explicit Euler
/// steps.
///
/// State is `[x, x_dot, theta, theta_dot]`. Action 0 pushes the cart left,
/// action 1 pushes it right. Every step is worth a reward of 1 until the
/// pole falls past 12 degrees or the cart leaves the track.
pub struct CartPole {
    rng: ChaCha8Rng,
    state: [f64; 4],
    terminated: bool,
}

impl CartPole {
    pub fn new(seed: u64) -> Self {
        let mut env = Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            state: [0.0; 4],
            terminated: false,
        };
        env.reset();
        env
    }

    fn observation(&self) -> State {
        self.state.iter().map(|&v| v as f32).collect()
    }

    fn is_out_of_bounds(&self) -> bool {
        let [x, _, theta, _] = self.state;
        !(-X_THRESHOLD..=X_THRESHOLD).contains(&x)
            || !(-THETA_THRESHOLD_RADIANS..=THETA_THRESHOLD_RADIANS).contains(&theta)
    }
}

impl Env for CartPole {
    fn observation_dim(&self) -> usize {
        4
    }

    fn action_space(&self) -> ActionSpace {
        ActionSpace::new(2)
    }

    fn reset(&mut self) -> State {
        for v in self.state.iter_mut() {
            *v = self.rng.gen_range(-0.05..0.05);
        }
        self.terminated = false;
        self.observation()
    }

    fn step(&mut self, action: usize) -> Step {
        assert!(
            self.action_space().contains(action),
            "invalid cart-pole action {action}"
        );
        if self.terminated {
            // stepping past the end keeps the episode ended without reward
            return Step {
                next_state: self.observation(),
                reward: 0.0,
                status: Status::Done(Done::Terminated),
            };
        }
        let [x, x_dot, theta, theta_dot] = self.state;
        let force = if action == 1 { FORCE_MAG } else { -FORCE_MAG };
        let (sin_theta, cos_theta) = theta.sin_cos();

        let temp = (force + POLE_MASS_LENGTH * theta_dot * theta_dot * sin_theta) / TOTAL_MASS;
        let theta_acc = (GRAVITY * sin_theta - cos_theta * temp)
            / (POLE_HALF_LENGTH * (4.0 / 3.0 - MASS_POLE * cos_theta * cos_theta / TOTAL_MASS));
        let x_acc = temp - POLE_MASS_LENGTH * theta_acc * cos_theta / TOTAL_MASS;

        self.state = [
            x + TAU * x_dot,
            x_dot + TAU * x_acc,
            theta + TAU * theta_dot,
            theta_dot + TAU * theta_acc,
        ];
        self.terminated = self.is_out_of_bounds();

        Step {
            next_state: self.observation(),
            reward: 1.0,
            status: if self.terminated {
                Status::Done(Done::Terminated)
            } else {
                Status::Running
            },
        }
    }
}
