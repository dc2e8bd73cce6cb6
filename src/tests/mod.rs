// Live test scenarios, driven by the test runner binary against a running
// chain. Unit tests live next to the code they exercise.
