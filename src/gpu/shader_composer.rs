use std::borrow::Cow;

use naga_oil::compose::{
    ComposableModuleDescriptor, Composer, NagaModuleDescriptor,
    ShaderLanguage, ShaderType,
};

/// Wraps `naga_oil::compose::Composer` to provide shader composition with
/// `#import` support.
///
/// Pre-loads the shared WGSL modules at construction time. Consuming
/// shaders use `#import myriad::module_name` to pull in shared code. The
/// composer produces `naga::Module` IR directly, skipping WGSL re-parse
/// at runtime.
pub struct ShaderComposer {
    composer: Composer,
}

/// Shared module definition: (source, file_path)
struct ModuleDef {
    source: &'static str,
    file_path: &'static str,
}

impl Default for ShaderComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl ShaderComposer {
    /// Build a composer with all shared modules registered.
    ///
    /// # Panics
    ///
    /// Panics if an embedded shared module fails to parse. The module
    /// sources are compiled into the binary, so this is a build defect,
    /// not a runtime condition.
    #[allow(clippy::panic, clippy::missing_panics_doc)]
    #[must_use]
    pub fn new() -> Self {
        let mut composer = Composer::default();

        // Register shared modules in dependency order.
        let modules: &[ModuleDef] = &[ModuleDef {
            source: include_str!("../../assets/shaders/modules/instance.wgsl"),
            file_path: "modules/instance.wgsl",
        }];

        for m in modules {
            let _ = composer
                .add_composable_module(ComposableModuleDescriptor {
                    source: m.source,
                    file_path: m.file_path,
                    language: ShaderLanguage::Wgsl,
                    ..Default::default()
                })
                .unwrap_or_else(|e| {
                    panic!(
                        "Failed to register shader module '{}': {e:?}",
                        m.file_path
                    )
                });
        }

        Self { composer }
    }

    /// Compose a shader source string (which may contain `#import`
    /// directives) into a `wgpu::ShaderModule` ready for pipeline creation.
    ///
    /// # Panics
    ///
    /// Panics if the embedded shader fails to compose (a build defect).
    #[allow(clippy::panic)]
    pub fn compose(
        &mut self,
        device: &wgpu::Device,
        label: &str,
        source: &str,
        file_path: &str,
    ) -> wgpu::ShaderModule {
        let naga_module = self
            .composer
            .make_naga_module(NagaModuleDescriptor {
                source,
                file_path,
                shader_type: ShaderType::Wgsl,
                ..Default::default()
            })
            .unwrap_or_else(|e| {
                panic!("Failed to compose shader '{file_path}': {e}")
            });

        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Naga(Cow::Owned(naga_module)),
        })
    }

    /// Compose a shader source into a `naga::Module` without creating a
    /// wgpu shader module. Useful for testing shader composition without
    /// a GPU device.
    ///
    /// # Errors
    ///
    /// Returns the composer error when the source fails to parse or an
    /// import cannot be resolved.
    pub fn compose_naga(
        &mut self,
        source: &str,
        file_path: &str,
    ) -> Result<naga::Module, Box<naga_oil::compose::ComposerError>> {
        self.composer
            .make_naga_module(NagaModuleDescriptor {
                source,
                file_path,
                shader_type: ShaderType::Wgsl,
                ..Default::default()
            })
            .map_err(Box::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Shader source definitions for all composable shaders in the
    /// project. Each entry is (source, file_path).
    fn all_shader_sources() -> Vec<(&'static str, &'static str)> {
        vec![
            (
                include_str!(
                    "../../assets/shaders/compute/position_kernel.wgsl"
                ),
                "position_kernel.wgsl",
            ),
            (
                include_str!(
                    "../../assets/shaders/raster/instanced_mesh.wgsl"
                ),
                "instanced_mesh.wgsl",
            ),
        ]
    }

    #[test]
    fn test_all_shaders_compose() {
        let mut composer = ShaderComposer::new();
        for (source, file_path) in all_shader_sources() {
            let _ = composer.compose_naga(source, file_path).unwrap_or_else(
                |e| panic!("Shader '{file_path}' failed to compose: {e}"),
            );
        }
    }
}
