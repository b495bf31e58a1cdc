mod helpers;
mod input_tests;
mod job_tests;
mod shuffle_tests;
