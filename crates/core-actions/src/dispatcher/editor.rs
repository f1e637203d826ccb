use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail, ensure};
use core_backend::{Backend, CmdBackend, CmdSpec, FileBackend, MemBackend};
use core_events::Reply;
use core_model::{RenderTarget, ViewId};
use tracing::{debug, info};

use crate::{EdAction, Session};

pub(super) fn handle(action: EdAction, session: &mut Session) -> Result<()> {
    match action {
        EdAction::Open {
            loc,
            view,
            rel,
            create,
            reply,
        } => {
            let res = open(session, &loc, view, &rel, create);
            respond(session, res, reply)
        }
        EdAction::OpenCmd {
            args,
            dir,
            title,
            reply,
        } => {
            let res = open_cmd(session, args, &dir, title);
            respond(session, res, reply)
        }
        EdAction::NewView(reply) => {
            let editor = session.editor_mut();
            let id = editor.new_view(Box::new(MemBackend::new()));
            editor.render(RenderTarget::All);
            let _ = reply.send(id);
            Ok(())
        }
        EdAction::DelView { view, check } => {
            del_view(session, view, check);
            Ok(())
        }
        EdAction::QuitCheck(reply) => {
            let _ = reply.send(session.editor().quit_check());
            Ok(())
        }
        EdAction::Views(reply) => {
            let _ = reply.send(session.editor().view_ids());
            Ok(())
        }
        EdAction::CurView(reply) => {
            let _ = reply.send(session.editor().cur_view());
            Ok(())
        }
        EdAction::ActivateView(id) => {
            let editor = session.editor_mut();
            if editor.activate_view(id) {
                editor.render(RenderTarget::View(id));
            }
            Ok(())
        }
        EdAction::SetStatus(msg) => {
            session.editor_mut().set_status(msg);
            Ok(())
        }
        EdAction::SetStatusErr(msg) => {
            session.editor_mut().set_status_err(msg);
            Ok(())
        }
        EdAction::Status(reply) => {
            let _ = reply.send(session.editor().status().clone());
            Ok(())
        }
        EdAction::Render(target) => {
            session.editor_mut().render(target);
            Ok(())
        }
        EdAction::AutoScrollTick => {
            let editor = session.editor_mut();
            let Some(view) = editor.cur_view_mut() else {
                return Ok(());
            };
            if view.auto_scroll_tick() {
                let id = view.id();
                editor.render(RenderTarget::View(id));
            }
            Ok(())
        }
    }
}

/// Hand the outcome to the waiting caller, or to the bus error hook when
/// nobody waits. Failures land on the status line either way.
fn respond(
    session: &mut Session,
    res: Result<ViewId>,
    reply: Option<Reply<Result<ViewId>>>,
) -> Result<()> {
    let Some(reply) = reply else {
        return res.map(|_| ());
    };
    if let Err(e) = &res {
        session.editor_mut().set_status_err(format!("{e:#}"));
    }
    let _ = reply.send(res);
    Ok(())
}

/// Open `loc` into `target` (or a new view). Relative locations resolve
/// against `rel`. Directories list through `ls -a1`; files load into a file
/// backend, created empty first when missing and `create` is set.
pub(crate) fn open(
    session: &mut Session,
    loc: &str,
    target: Option<ViewId>,
    rel: &Path,
    create: bool,
) -> Result<ViewId> {
    let loc = loc.trim();
    ensure!(!loc.is_empty(), "nothing to open");
    let joined = if Path::new(loc).is_absolute() {
        PathBuf::from(loc)
    } else {
        rel.join(loc)
    };
    let path = std::path::absolute(&joined)
        .with_context(|| format!("cannot resolve {}", joined.display()))?;
    let is_dir = match std::fs::metadata(&path) {
        Ok(meta) => meta.is_dir(),
        Err(e) if create && e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => return Err(e).with_context(|| format!("cannot open {}", path.display())),
    };
    if let Some(id) = target
        && session.editor().view(id).is_none()
    {
        bail!("no such view: {id}");
    }
    let id = match target {
        Some(id) => id,
        None => session.editor_mut().reserve_id(),
    };
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let (backend, title, work_dir): (Box<dyn Backend>, String, PathBuf) = if is_dir {
        let title = format!("{name}/");
        let mut spec = CmdSpec::new(vec!["ls".to_string(), "-a1".to_string()], &path);
        spec.title = Some(title.clone());
        spec.scroll_top = true;
        spec.instance_id = session.editor().instance_id();
        spec.view_id = id.0;
        let backend = CmdBackend::start(spec, session.cmd_options(), session.cmd_host(id))?;
        (Box::new(backend), title, path.clone())
    } else {
        let backend = if create {
            FileBackend::create(&path)?
        } else {
            FileBackend::open(&path)?
        };
        let dir = path.parent().map_or_else(|| path.clone(), Path::to_path_buf);
        (Box::new(backend), name, dir)
    };

    let editor = session.editor_mut();
    match editor.view_mut(id) {
        Some(view) => {
            view.set_backend(backend);
            view.set_title(title);
            view.set_work_dir(&work_dir);
        }
        None => {
            let mut view = editor.build_view(id, backend);
            view.set_title(title);
            view.set_work_dir(&work_dir);
            editor.insert_view(view);
        }
    }
    if is_dir {
        editor.set_status(work_dir.display().to_string());
    } else {
        editor.set_status(format!("{}  [{id}]", work_dir.display()));
    }
    editor.render(RenderTarget::All);
    info!(target: "actions.open", view = %id, path = %path.display(), is_dir, "opened");
    Ok(id)
}

fn open_cmd(
    session: &mut Session,
    args: Vec<String>,
    dir: &Path,
    title: Option<String>,
) -> Result<ViewId> {
    ensure!(!args.is_empty(), "empty command line");
    let dir = std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf());
    let id = session.editor_mut().reserve_id();
    let mut spec = CmdSpec::new(args, &dir);
    spec.title = title;
    spec.instance_id = session.editor().instance_id();
    spec.view_id = id.0;
    let title = spec.title();
    let backend = CmdBackend::start(spec, session.cmd_options(), session.cmd_host(id))?;

    let editor = session.editor_mut();
    let mut view = editor.build_view(id, Box::new(backend));
    view.set_title(title);
    view.set_work_dir(&dir);
    editor.insert_view(view);
    editor.render(RenderTarget::All);
    info!(target: "actions.open", view = %id, dir = %dir.display(), "command_started");
    Ok(id)
}

fn del_view(session: &mut Session, id: ViewId, check: bool) {
    let editor = session.editor_mut();
    let Some(view) = editor.view(id) else {
        debug!(target: "actions.dispatch", view = %id, "del_unknown_view");
        return;
    };
    if check && !view.can_close() {
        let msg = format!(
            "unsaved changes in {}: save first or close without check",
            view.title()
        );
        editor.set_status_err(msg);
        return;
    }
    editor.remove_view(id);
    editor.render(RenderTarget::All);
}
