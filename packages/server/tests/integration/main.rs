mod admin;
mod booking;
mod common;
mod print;
mod tracking;
