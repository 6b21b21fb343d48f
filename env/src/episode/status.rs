#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Running,
    Done(Done),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Done {
    // the episode reached a terminal state of the task itself. the value of
    // anything after it is zero
    Terminated,
    // the episode was cut short from outside (a step limit). the last state
    // is not terminal and still has a future value
    Truncated,
}

impl Status {
    pub fn is_done(&self) -> bool {
        matches!(self, Status::Done(_))
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self, Status::Done(Done::Terminated))
    }
}
