mod cursor_tests;
mod enumerator_tests;
mod test_helpers;
