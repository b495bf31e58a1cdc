mod properties;
mod salter_tests;
mod splits_tests;
mod table_tests;
