// Harness Test Suite
// One module per concern; HTTP behavior is exercised offline through wiremock.

#[cfg(test)]
mod fake_backend;
