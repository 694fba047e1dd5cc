use std::{env, error::Error, path::PathBuf};

fn main() -> Result<(), Box<dyn Error>> {
    // Fall back to the bundled protoc when none is configured
    if env::var_os("PROTOC").is_none() {
        env::set_var("PROTOC", protoc_bin_vendored::protoc_bin_path()?);
    }
    let well_known_types = protoc_bin_vendored::include_path()?;

    tonic_build::configure()
        .build_server(true)
        .build_client(false)
        .compile_protos(
            &[
                "auth_protobuf_scheme/auth/protobuf/auth_service.proto",
            ],
            &[PathBuf::from("auth_protobuf_scheme"), well_known_types],
        )?;

    println!("cargo:rerun-if-changed=auth_protobuf_scheme");
    Ok(())
}
