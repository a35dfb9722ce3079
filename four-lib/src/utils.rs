//! contains small utility functions that have nowhere else to go

macro_rules! bug {
    ($msg:literal $(, $args:tt)*) => {
       panic!(concat!("An Interpreter bug occured:\n\n", $msg) $(, $args)*)
    };
}

pub(crate) use bug;
