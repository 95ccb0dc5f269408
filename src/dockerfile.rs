//! Container build definition rendering.
//!
//! Pure text generation: the render has no filesystem access, so its output
//! is snapshot-testable. The container gets a synthetic unprivileged user
//! matching the invoking user's numeric identity, so files written into the
//! bind-mounted staging directory come back owned by the caller.

use std::fmt::Write;

/// Inputs of a render: the invoking user's numeric identity plus the
/// ordered patch list.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub uid: u32,
    pub gid: u32,
    pub patches: Vec<String>,
    pub base_image: String,
    pub build_packages: Vec<String>,
    pub helper_binary: String,
}

/// Render the Dockerfile for the kernel compilation container.
///
/// Emits one COPY instruction per patch, preserving the input order.
pub fn render(ctx: &RenderContext) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "FROM {}", ctx.base_image);
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "RUN apt-get update && apt-get install -y {}",
        ctx.build_packages.join(" ")
    );
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "COPY {} /usr/bin/{}",
        ctx.helper_binary, ctx.helper_binary
    );
    for patch in &ctx.patches {
        let _ = writeln!(out, "COPY {} /usr/src/{}", patch, patch);
    }
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "RUN echo 'builduser:x:{uid}:{gid}:nobody:/:/bin/sh' >> /etc/passwd && \\\n    chown -R {uid}:{gid} /usr/src",
        uid = ctx.uid,
        gid = ctx.gid
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "USER builduser");
    let _ = writeln!(out, "WORKDIR /usr/src");
    let _ = writeln!(out, "ENTRYPOINT /usr/bin/{}", ctx.helper_binary);

    out
}
