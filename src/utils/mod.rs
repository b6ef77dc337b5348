pub mod stats;
#[cfg(test)]
pub mod test_utils;
