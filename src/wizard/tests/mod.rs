mod common;
mod progression;
