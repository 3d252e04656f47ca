/*!
 * Permission Taxonomy
 * Built-in namespace plus compile-time-checked key constants
 *
 * Both the [`definition`] literal registered into the tree and the constant
 * modules (`queue::add::stream == "queue.add.stream"`) are generated from the
 * single declaration at the bottom of this file, so a key used in code always
 * exists in the tree.
 */

/// Dotted path of an ident sequence
macro_rules! perm_path {
    ($first:ident $($rest:ident)*) => {
        concat!(stringify!($first) $(, ".", stringify!($rest))*)
    };
}

/// Emit one module per namespace and one constant per key
macro_rules! perm_consts {
    ([$($path:ident)*]) => {};
    ([$($path:ident)*] $name:ident { $($inner:tt)* } $(, $($rest:tt)*)?) => {
        pub mod $name {
            perm_consts!([$($path)* $name] $($inner)*);
        }
        perm_consts!([$($path)*] $($($rest)*)?);
    };
    ([$($path:ident)*] $name:ident $(, $($rest:tt)*)?) => {
        #[allow(non_upper_case_globals)]
        pub const $name: &str = perm_path!($($path)* $name);
        perm_consts!([$($path)*] $($($rest)*)?);
    };
}

/// Build the `NamespaceDef` children of one level
macro_rules! perm_def {
    (@children [$($acc:expr),*]) => {
        vec![$($acc),*]
    };
    (@children [$($acc:expr),*] $name:ident { $($inner:tt)* } $(, $($rest:tt)*)?) => {
        perm_def!(@children [
            $($acc,)*
            $crate::permissions::tree::NamespaceDef::node(
                stringify!($name),
                perm_def!(@children [] $($inner)*)
            )
        ] $($($rest)*)?)
    };
    (@children [$($acc:expr),*] $name:ident $(, $($rest:tt)*)?) => {
        perm_def!(@children [
            $($acc,)*
            $crate::permissions::tree::NamespaceDef::leaf(stringify!($name))
        ] $($($rest)*)?)
    };
}

macro_rules! permission_tree {
    ($($body:tt)*) => {
        perm_consts!([] $($body)*);

        /// Namespace literal the key constants are generated from
        pub fn definition() -> $crate::permissions::tree::NamespaceDef {
            $crate::permissions::tree::NamespaceDef::root(perm_def!(@children [] $($body)*))
        }
    };
}

permission_tree! {
    admin {
        control { execute, shutdown, impersonate },
        config { runtime },
        appearance { name, avatar }
    },
    queue {
        add { entry, playlist, stream },
        edit,
        remove,
        reorder,
        replay,
        inspect { current, queue, history }
    },
    player { pause, seek, skip, revert, volume },
    summon { join, steal },
    playlist {
        owned { create, export },
        all { edit, remove }
    },
    roles { view, edit, assign },
    webiesela { register }
}
