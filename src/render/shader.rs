//! Shader loading with a textual include mechanism.
//!
//! `shaders/common.wgsl` declares the uniform and blade-instance structs
//! shared across pipeline stages. It is textually prepended to every module
//! that needs those layouts; the contract is that the structs declared
//! there byte-match the CPU-side `#[repr(C)]` structs, padding included.

/// Shared struct header prepended to shader bodies
pub const COMMON: &str = include_str!("../../shaders/common.wgsl");

/// Prepend the common struct header to a shader body
pub fn with_common(body: &str) -> String {
    let mut source = String::with_capacity(COMMON.len() + body.len() + 1);
    source.push_str(COMMON);
    source.push('\n');
    source.push_str(body);
    source
}

/// Create a shader module from a body that depends on the common header
pub fn module(device: &wgpu::Device, label: &str, body: &str) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(with_common(body).into()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_declares_shared_structs() {
        assert!(COMMON.contains("struct GlobalUniforms"));
        assert!(COMMON.contains("struct BladeInstance"));
        assert!(COMMON.contains("struct LightBlock"));
    }

    #[test]
    fn test_with_common_prepends_header() {
        let source = with_common("@fragment fn fs_main() {}");
        assert!(source.starts_with(COMMON));
        assert!(source.ends_with("@fragment fn fs_main() {}"));
    }

    #[test]
    fn test_generation_shader_has_no_time_term() {
        // The generation pass must be a pure function of the grid
        // coordinate; time only ever enters through the movement pass.
        let r#gen = include_str!("../../shaders/grass_gen.wgsl");
        assert!(!r#gen.contains("time"));
        assert!(!r#gen.contains("frame"));
    }
}
