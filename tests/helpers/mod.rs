// ==========================================
// 集成测试共享 Mock
// ==========================================

#![allow(dead_code)]

pub mod mock_config;
pub mod mock_provisioner;
pub mod mock_store;

pub use mock_config::MockConfig;
pub use mock_provisioner::RecordingProvisioner;
pub use mock_store::MemoryStore;
