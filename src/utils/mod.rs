#[cfg(test)]
pub mod arbitrary;
pub mod buffer;
