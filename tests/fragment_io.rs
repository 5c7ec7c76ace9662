mod util;
use util::*;

use mesh_reconstruct::io::fragment::{
    ProcessorFragment, read_boundary, read_face_list, read_fragment, read_list, write_field,
};
use mesh_reconstruct::prelude::*;

#[test]
fn fragment_files_reload_to_the_same_mesh() {
    let global = block_mesh(4, 2, 1);
    let fragments = decompose(&global, &slabs_x(4, 2, 1, 2));
    let (_dir, case) = scratch_case();
    write_case(&case, &fragments);

    assert_eq!(case.list_processors().unwrap(), vec![0, 1]);
    let handler = FileHandler::default();
    for (proci, mesh) in fragments.iter().enumerate() {
        let fragment = read_fragment(&handler, &case, proci).unwrap();
        assert_eq!(fragment.processor, proci);
        assert_eq!(&fragment.mesh, mesh);
        assert_eq!(fragment.bounds, mesh.bounds());
    }

    let faces = read_face_list(case.local_path(1, "faces")).unwrap();
    assert_eq!(faces, fragments[1].faces());
    let owner: Vec<usize> = read_list(case.local_path(1, "owner")).unwrap();
    assert_eq!(owner, fragments[1].owner());
    let boundary = read_boundary(case.local_path(1, "boundary")).unwrap();
    assert_eq!(
        boundary.last().map(|p| p.kind),
        Some(PatchKind::Processor { my_proc: 1, neighb_proc: 0 })
    );
}

#[test]
fn collated_handler_refuses_fragment_reads() {
    let (_dir, case) = scratch_case();
    write_case(&case, &decompose(&block_mesh(2, 1, 1), &[0, 1]));

    let handler = FileHandler::new(FileAccessMode::Collated);
    let err = read_fragment(&handler, &case, 0).unwrap_err();
    assert!(matches!(err, MeshError::CollatedAccess(_)), "{err}");

    let mut handler = handler;
    {
        let mut control = FileHandlerControl::new(&mut handler);
        control.set_uncollated();
        read_fragment(&control, &case, 0).unwrap();
    }
    assert_eq!(handler.mode(), FileAccessMode::Collated);
}

#[test]
fn cell_field_length_is_checked() {
    let (_dir, case) = scratch_case();
    let fragments = decompose(&block_mesh(2, 1, 1), &[0, 1]);
    write_case(&case, &fragments);
    write_field(case.field_path(0, "0", "p"), &[1.0, 2.0]).unwrap();

    let handler = FileHandler::default();
    let mut fragment = ProcessorFragment::from_mesh(0, fragments[0].clone());
    let err = fragment
        .load_cell_field(&handler, &case, "0", "p")
        .unwrap_err();
    assert!(matches!(err, MeshError::Parse { .. }), "{err}");
    assert!(fragment.cell_fields.is_empty());
}
