//! Unit tests for program metadata reflection
//!
//! Exercises the merge of reflected descriptors across stages, no GPU or
//! SPIR-V compiler required.

use super::*;

fn uniform(name: &str, binding: u32, size: u32) -> ReflectedDescriptor {
    ReflectedDescriptor {
        name: name.to_string(),
        set: 0,
        binding,
        kind: DescriptorType::UniformBuffer,
        size,
        count: 1,
    }
}

fn sampler(name: &str, binding: u32, count: u32) -> ReflectedDescriptor {
    ReflectedDescriptor {
        name: name.to_string(),
        set: 0,
        binding,
        kind: DescriptorType::CombinedImageSampler,
        size: 0,
        count,
    }
}

#[test]
fn test_build_splits_and_sorts_by_binding() {
    let descriptors = vec![
        sampler("normal_map", 3, 1),
        uniform("Object", 1, 64),
        sampler("albedo", 2, 1),
        uniform("Camera", 0, 128),
    ];

    let program = build_program_meta("Lit", descriptors).unwrap();
    assert_eq!(program.name, "Lit");
    assert_eq!(program.uniform_blocks, vec![
        UniformBlockMeta { name: "Camera".to_string(), slot: 0, size: 128 },
        UniformBlockMeta { name: "Object".to_string(), slot: 1, size: 64 },
    ]);
    assert_eq!(program.samplers, vec![
        SamplerMeta { name: "albedo".to_string(), location: 2, array_size: 1 },
        SamplerMeta { name: "normal_map".to_string(), location: 3, array_size: 1 },
    ]);
}

#[test]
fn test_build_merges_stages_sharing_a_binding() {
    // Vertex and fragment stages both read the camera block; the fragment
    // stage only declares a prefix of it
    let descriptors = vec![
        uniform("Camera", 0, 128),
        uniform("", 0, 64),
        sampler("cascades", 1, 4),
        sampler("cascades", 1, 4),
    ];

    let program = build_program_meta("Shadowed", descriptors).unwrap();
    assert_eq!(program.uniform_blocks.len(), 1);
    assert_eq!(program.uniform_blocks[0].size, 128);
    assert_eq!(program.uniform_blocks[0].name, "Camera");
    assert_eq!(program.samplers.len(), 1);
    assert_eq!(program.samplers[0].array_size, 4);
    assert_eq!(program.image_count(), 4);
}

#[test]
fn test_build_takes_name_from_any_stage() {
    let program = build_program_meta("P", vec![uniform("", 0, 16), uniform("Globals", 0, 16)]).unwrap();
    assert_eq!(program.uniform_blocks[0].name, "Globals");
}

#[test]
fn test_build_rejects_conflicting_types() {
    let result = build_program_meta("Broken", vec![uniform("Camera", 0, 64), sampler("albedo", 0, 1)]);
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

#[test]
fn test_build_rejects_other_descriptor_sets() {
    let mut material = uniform("Material", 0, 32);
    material.set = 1;
    let result = build_program_meta("MultiSet", vec![material]);
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

#[test]
fn test_build_rejects_runtime_sized_arrays() {
    let result = build_program_meta("Bindless", vec![sampler("textures", 0, 0)]);
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

#[test]
fn test_build_without_descriptors() {
    let program = build_program_meta("Fullscreen", Vec::new()).unwrap();
    assert!(!program.has_bindings());
}

#[test]
fn test_reflect_without_modules() {
    let program = reflect_program_meta("Empty", &[]).unwrap();
    assert_eq!(program, ProgramMeta::new("Empty"));
}
